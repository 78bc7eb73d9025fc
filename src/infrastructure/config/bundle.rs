//! Environment bundle output configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Where the bundle is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Bundle file. Defaults to ".env" in the working directory.
    pub path: PathBuf,

    /// Deploy the chart in dev mode and mirror the keys to `local_key_path`.
    pub dev_mode: bool,

    /// Key file read by the chat app in dev mode.
    pub local_key_path: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".env"),
            dev_mode: true,
            local_key_path: PathBuf::from("/tmp/meilisearch-keys.env"),
        }
    }
}
