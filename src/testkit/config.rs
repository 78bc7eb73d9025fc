//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests. Every wait
//! is shortened so tests run under a paused clock in milliseconds.

use std::path::Path;

use crate::infrastructure::config::settings::Config;

/// Default configuration with short waits, writing the bundle under `dir`.
pub fn fast(dir: &Path) -> Config {
    let mut config = Config::default();
    config.search.readiness_timeout_secs = 3;
    config.search.poll_interval_secs = 1;
    config.keys.job_timeout_secs = 3;
    config.keys.job_poll_interval_secs = 1;
    config.inference.startup_timeout_secs = 2;
    config.inference.poll_interval_ms = 100;
    config.bundle.path = dir.join(".env");
    config.bundle.local_key_path = dir.join("meilisearch-keys.env");
    config
}
