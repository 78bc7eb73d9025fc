//! Handler for `stackup status`.
//!
//! Checks each component once, without waiting, and prints a table.

use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::output;
use crate::application::environment;
use crate::domain::{BundleKey, ServiceEndpoint};
use crate::error::Result;
use crate::infrastructure::bootstrap::Adapters;
use crate::infrastructure::config::settings::Config;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "State")]
    state: String,
}

impl StatusRow {
    fn new(component: &str, target: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            component: component.to_string(),
            target: target.into(),
            state: state.into(),
        }
    }
}

/// Execute `status`.
pub async fn execute(config: &Config) -> Result<()> {
    let adapters = Adapters::from_config(config)?;
    let mut rows = Vec::new();

    let pods = match adapters.cluster.pods_ready(&config.search.selector).await {
        Ok(true) => "ready".to_string(),
        Ok(false) => "not ready".to_string(),
        Err(e) => format!("unknown ({e})"),
    };
    rows.push(StatusRow::new("pods", &config.search.selector, pods));

    match adapters.cluster.service_endpoint(&config.search.service).await {
        Ok(endpoint) => {
            let healthy = adapters.search.is_healthy(&endpoint).await;
            rows.push(StatusRow::new(
                "search",
                endpoint.url(),
                if healthy { "healthy" } else { "unreachable" },
            ));
        }
        Err(e) => rows.push(StatusRow::new("search", &config.search.service, format!("unknown ({e})"))),
    }

    let job = match adapters.cluster.job_complete(&config.keys.job).await {
        Ok(true) => "complete".to_string(),
        Ok(false) => "pending or absent".to_string(),
        Err(e) => format!("unknown ({e})"),
    };
    rows.push(StatusRow::new("key job", &config.keys.job, job));

    let inference = ServiceEndpoint::local(config.inference.port);
    let state = if !adapters.host.port_open(config.inference.port).await {
        "not running".to_string()
    } else if adapters.inference.is_healthy(&inference).await {
        match adapters.inference.list_models(&inference).await {
            Ok(models) => format!("healthy, {} models", models.len()),
            Err(_) => "healthy".to_string(),
        }
    } else {
        "unhealthy".to_string()
    };
    rows.push(StatusRow::new("inference", inference.url(), state));

    let bundle = match environment::read(&config.bundle.path) {
        Ok(pairs) => {
            let empty: Vec<&str> = pairs
                .iter()
                .filter(|(k, v)| BundleKey::from_name(k).is_some() && v.is_empty())
                .map(|(k, _)| k.as_str())
                .collect();
            if empty.is_empty() {
                "complete".to_string()
            } else {
                format!("empty: {}", empty.join(", "))
            }
        }
        Err(_) => "missing".to_string(),
    };
    rows.push(StatusRow::new(
        "bundle",
        config.bundle.path.display().to_string(),
        bundle,
    ));

    if output::is_json() {
        let components: Vec<_> = rows
            .iter()
            .map(|r| json!({ "component": r.component, "target": r.target, "state": r.state }))
            .collect();
        output::json_output(json!({ "command": "status", "components": components }));
        return Ok(());
    }

    output::section("Status");
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    output::lines(&table.to_string());
    Ok(())
}
