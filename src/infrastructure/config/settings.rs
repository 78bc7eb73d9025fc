//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section has defaults, so an empty file (or no file) yields a working
//! configuration for a local kind/k3d cluster.
//!
//! # Example
//!
//! ```no_run
//! use stackup::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default("stackup.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::bundle::BundleConfig;
use super::cluster::ClusterConfig;
use super::inference::InferenceConfig;
use super::logging::LoggingConfig;
use super::search::{KeysConfig, SearchConfig};
use crate::domain::DeploymentTarget;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Release, chart and control-plane tooling.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Search service target.
    #[serde(default)]
    pub search: SearchConfig,

    /// API key secrets and the job that writes them.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Local inference runtime.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Bundle output.
    #[serde(default)]
    pub bundle: BundleConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub namespace: Option<String>,
    pub release: Option<String>,
    pub chart: Option<String>,
    pub model: Option<String>,
    pub bundle_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load from `path` when it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] when the file exists.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply command-line overrides and re-validate.
    ///
    /// # Errors
    ///
    /// Returns an error if an override produces an invalid configuration.
    #[allow(clippy::result_large_err)]
    pub fn apply(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(namespace) = overrides.namespace {
            self.cluster.namespace = namespace;
        }
        if let Some(release) = overrides.release {
            self.cluster.release = release;
        }
        if let Some(chart) = overrides.chart {
            self.cluster.chart = chart;
        }
        if let Some(model) = overrides.model {
            self.inference.model = model;
        }
        if let Some(path) = overrides.bundle_path {
            self.bundle.path = path;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.json_logs {
            self.logging.format = "json".to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// The search service as a deployment target.
    #[must_use]
    pub fn search_target(&self) -> DeploymentTarget {
        DeploymentTarget::cluster(
            &self.search.name,
            &self.search.selector,
            &self.search.service,
            self.search.port,
        )
        .with_health_path(&self.search.health_path)
        .with_readiness(
            Duration::from_secs(self.search.readiness_timeout_secs),
            Duration::from_secs(self.search.poll_interval_secs),
        )
    }

    /// The local inference runtime as a deployment target.
    #[must_use]
    pub fn inference_target(&self) -> DeploymentTarget {
        DeploymentTarget::host(&self.inference.binary, self.inference.port)
            .with_health_path(&self.inference.health_path)
            .with_readiness(
                Duration::from_secs(self.inference.startup_timeout_secs),
                Duration::from_millis(self.inference.poll_interval_ms),
            )
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let required: [(&'static str, &str); 11] = [
            ("cluster.kubectl", &self.cluster.kubectl),
            ("cluster.helm", &self.cluster.helm),
            ("cluster.namespace", &self.cluster.namespace),
            ("cluster.release", &self.cluster.release),
            ("cluster.chart", &self.cluster.chart),
            ("search.service", &self.search.service),
            ("search.selector", &self.search.selector),
            ("keys.secret", &self.keys.secret),
            ("keys.master_secret", &self.keys.master_secret),
            ("keys.job", &self.keys.job),
            ("inference.model", &self.inference.model),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField { field }.into());
            }
        }

        if let Err(e) = url::Host::parse(&self.cluster.node_host) {
            return Err(ConfigError::InvalidValue {
                field: "cluster.node_host",
                reason: e.to_string(),
            }
            .into());
        }

        if self.search.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.port",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.search.poll_interval_secs == 0 || self.keys.job_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.search.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.inference.enabled {
            if self.inference.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "inference.port",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
            if self.inference.start_command.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "inference.start_command",
                }
                .into());
            }
            if self.inference.install_command.is_empty() {
                return Err(ConfigError::MissingField {
                    field: "inference.install_command",
                }
                .into());
            }
            if self.inference.poll_interval_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "inference.poll_interval_ms",
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if self.bundle.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "bundle.path",
            }
            .into());
        }
        if self.bundle.dev_mode && self.bundle.local_key_path == self.bundle.path {
            return Err(ConfigError::InvalidValue {
                field: "bundle.local_key_path",
                reason: "must differ from bundle.path".to_string(),
            }
            .into());
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected 'pretty' or 'json', got '{other}'"),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetLocation;
    use crate::error::Error;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.cluster.release, "devstack");
        assert_eq!(config.keys.secret, "meilisearch-api-keys");
        assert_eq!(config.inference.port, 11435);
        assert_eq!(config.inference.model, "llama3.2");
        assert_eq!(config.bundle.path, PathBuf::from(".env"));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse_toml(
            r#"
            [cluster]
            namespace = "search-dev"

            [cluster.overrides]
            "meilisearch.persistence" = "false"
            "#,
        )
        .unwrap();
        assert_eq!(config.cluster.namespace, "search-dev");
        assert_eq!(config.cluster.helm, "helm");
        assert_eq!(
            config.cluster.overrides.get("meilisearch.persistence").map(String::as_str),
            Some("false")
        );
    }

    #[test]
    fn blank_release_is_rejected() {
        let err = Config::parse_toml("[cluster]\nrelease = \"\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "cluster.release"
            })
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = Config::parse_toml("[search]\npoll_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn malformed_node_host_is_rejected() {
        let err = Config::parse_toml("[cluster]\nnode_host = \"bad host\"\n").unwrap_err();
        assert!(err.to_string().contains("cluster.node_host"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = Config::parse_toml("[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn disabled_inference_skips_inference_checks() {
        let config = Config::parse_toml(
            "[inference]\nenabled = false\nstart_command = []\ninstall_command = []\n",
        );
        assert!(config.is_ok());
    }

    #[test]
    fn overrides_take_precedence() {
        let config = Config::default()
            .apply(ConfigOverrides {
                namespace: Some("ci".into()),
                model: Some("mistral".into()),
                json_logs: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.cluster.namespace, "ci");
        assert_eq!(config.inference.model, "mistral");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn targets_reflect_sections() {
        let config = Config::default();
        let search = config.search_target();
        assert_eq!(search.port(), 7700);
        assert_eq!(search.readiness_timeout(), Duration::from_secs(180));
        assert!(matches!(search.location(), TargetLocation::Cluster { .. }));

        let inference = config.inference_target();
        assert_eq!(inference.port(), 11435);
        assert_eq!(inference.health_path(), "/api/tags");
        assert_eq!(inference.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("/nonexistent/stackup.toml").unwrap();
        assert_eq!(config.search.port, 7700);
    }
}
