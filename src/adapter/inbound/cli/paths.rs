//! Path utilities for stackup.
//!
//! Configuration is looked up in the working directory first
//! (`./stackup.toml`), then under `~/.stackup/config.toml`.

use std::path::{Path, PathBuf};

/// Project-local configuration file name.
pub const LOCAL_CONFIG: &str = "stackup.toml";

/// Returns the stackup home directory (`~/.stackup/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stackup")
}

/// Returns the default config file path.
pub fn default_config() -> PathBuf {
    resolve_config(Path::new(LOCAL_CONFIG), &home_dir())
}

fn resolve_config(local: &Path, home: &Path) -> PathBuf {
    if local.exists() {
        local.to_path_buf()
    } else {
        let user = home.join("config.toml");
        if user.exists() {
            user
        } else {
            local.to_path_buf()
        }
    }
}
