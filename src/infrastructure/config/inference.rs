//! Local inference runtime configuration.

use serde::Deserialize;

/// How the inference runtime is installed, started and provisioned.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Manage the local runtime at all. Defaults to true.
    pub enabled: bool,

    /// Executable that must be on `PATH`.
    pub binary: String,

    /// Port the runtime listens on. Defaults to 11435.
    pub port: u16,

    /// Package-manager command installing `binary` when missing.
    ///
    /// The first element must itself be on `PATH`.
    pub install_command: Vec<String>,

    /// Command starting the server in the foreground.
    pub start_command: Vec<String>,

    /// Health endpoint path. Defaults to "/api/tags".
    pub health_path: String,

    /// How long to wait for the server to come up. Defaults to 30 seconds.
    pub startup_timeout_secs: u64,

    /// Delay between health checks. Defaults to 1000 ms.
    pub poll_interval_ms: u64,

    /// Chat model to make available.
    pub model: String,

    /// Embedding model to make available.
    pub embedding_model: String,

    /// HTTP timeout; model pulls can take minutes. Defaults to 1800 seconds.
    pub request_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "ollama".to_string(),
            port: 11435,
            install_command: default_install_command(),
            start_command: vec!["ollama".to_string(), "serve".to_string()],
            health_path: "/api/tags".to_string(),
            startup_timeout_secs: 30,
            poll_interval_ms: 1000,
            model: "llama3.2".to_string(),
            embedding_model: "all-minilm".to_string(),
            request_timeout_secs: 1800,
        }
    }
}

#[cfg(target_os = "macos")]
fn default_install_command() -> Vec<String> {
    vec!["brew".to_string(), "install".to_string(), "ollama".to_string()]
}

#[cfg(not(target_os = "macos"))]
fn default_install_command() -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        "curl -fsSL https://ollama.com/install.sh | sh".to_string(),
    ]
}
