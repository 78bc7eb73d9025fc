//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use serde_json::json;

use super::diagnostic::ConfigDiagnostic;
use super::output;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::settings::Config;

/// Execute `config show` for an already loaded configuration.
pub fn execute_show(path: &Path, config: &Config) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "path": path.display().to_string(),
            "source": if path.exists() { "file" } else { "defaults" },
            "cluster": {
                "namespace": config.cluster.namespace,
                "context": config.cluster.context,
                "release": config.cluster.release,
                "chart": config.cluster.chart,
                "node_host": config.cluster.node_host,
                "overrides": config.cluster.overrides,
            },
            "search": {
                "service": config.search.service,
                "selector": config.search.selector,
                "port": config.search.port,
                "readiness_timeout_secs": config.search.readiness_timeout_secs,
            },
            "keys": {
                "secret": config.keys.secret,
                "master_secret": config.keys.master_secret,
                "job": config.keys.job,
            },
            "inference": {
                "enabled": config.inference.enabled,
                "port": config.inference.port,
                "model": config.inference.model,
                "embedding_model": config.inference.embedding_model,
            },
            "bundle": {
                "path": config.bundle.path.display().to_string(),
                "dev_mode": config.bundle.dev_mode,
                "local_key_path": config.bundle.local_key_path.display().to_string(),
            },
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    if path.exists() {
        output::field("File", path.display());
    } else {
        output::field("File", output::muted(format!("{} (not found, defaults)", path.display())));
    }

    output::section("Cluster");
    output::field("Namespace", &config.cluster.namespace);
    output::field(
        "Context",
        config.cluster.context.as_deref().unwrap_or("(current)"),
    );
    output::field("Release", &config.cluster.release);
    output::field("Chart", &config.cluster.chart);
    output::field("Node host", &config.cluster.node_host);
    for (key, value) in &config.cluster.overrides {
        output::field("Override", format!("{key}={value}"));
    }

    output::section("Search");
    output::field("Service", &config.search.service);
    output::field("Selector", &config.search.selector);
    output::field("Port", config.search.port);
    output::field(
        "Readiness",
        format!(
            "{}s, every {}s",
            config.search.readiness_timeout_secs, config.search.poll_interval_secs
        ),
    );

    output::section("Keys");
    output::field("Secret", &config.keys.secret);
    output::field("Master secret", &config.keys.master_secret);
    output::field("Job", &config.keys.job);

    output::section("Inference");
    output::field("Enabled", if config.inference.enabled { "yes" } else { "no" });
    if config.inference.enabled {
        output::field("Port", config.inference.port);
        output::field("Model", &config.inference.model);
        output::field("Embedding", &config.inference.embedding_model);
    }

    output::section("Bundle");
    output::field("Path", config.bundle.path.display());
    output::field("Dev mode", if config.bundle.dev_mode { "on" } else { "off" });
    if config.bundle.dev_mode {
        output::field("Key file", config.bundle.local_key_path.display());
    }
    Ok(())
}

/// Execute `config validate`.
///
/// TOML syntax and type errors are rendered with the offending span.
pub fn execute_validate(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

    match Config::parse_toml(&content) {
        Ok(_) => {
            if output::is_json() {
                output::json_output(json!({
                    "command": "config.validate",
                    "path": path.display().to_string(),
                    "valid": true,
                }));
            } else {
                output::section("Config Validation");
                output::field("Path", path.display());
                output::success("Config file is valid");
                output::hint(&format!("stackup config show -c {}", path.display()));
            }
            Ok(())
        }
        Err(Error::Config(ConfigError::Parse(e))) => {
            if let Some(diagnostic) = ConfigDiagnostic::from_toml(&e, path.display().to_string(), &content) {
                let diagnostic = diagnostic.with_help("see `stackup config show` for the expected fields");
                if !output::is_json() {
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
            }
            Err(ConfigError::Parse(e).into())
        }
        Err(e) => Err(e),
    }
}
