//! Handler for `stackup up`.

use std::sync::Arc;

use serde_json::json;

use super::command::UpArgs;
use super::output;
use super::progress::SpinnerReporter;
use crate::application::bootstrap::BootstrapReport;
use crate::domain::mask;
use crate::error::Result;
use crate::infrastructure::bootstrap::{driver, Adapters, RunOptions};
use crate::infrastructure::config::settings::Config;

/// Execute `up`: run the full bootstrap and report the bundle.
pub async fn execute(args: &UpArgs, config: &Config) -> Result<()> {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Release", &config.cluster.release);
    output::field("Namespace", &config.cluster.namespace);
    output::field("Chart", &config.cluster.chart);

    let reporter = Arc::new(SpinnerReporter::new());
    let options = RunOptions {
        keep_existing: args.keep_existing,
        skip_inference: args.skip_inference,
    };
    let driver = driver(config, options, Adapters::from_config(config)?, reporter.clone());

    output::section("Bootstrap");
    let report = match driver.run().await {
        Ok(report) => report,
        Err(failure) => {
            reporter.abort(&failure.to_string());
            return Err(failure.into());
        }
    };

    render(&report);
    Ok(())
}

fn render(report: &BootstrapReport) {
    if output::is_json() {
        let entries: serde_json::Map<String, serde_json::Value> = report
            .bundle
            .entries()
            .iter()
            .map(|(key, value)| {
                let shown = if key.is_secret() { mask(value) } else { value.clone() };
                (key.as_str().to_string(), json!(shown))
            })
            .collect();
        let warnings: Vec<_> = report
            .warnings
            .iter()
            .map(|w| json!({ "stage": w.stage.label(), "message": w.message }))
            .collect();
        output::json_output(json!({
            "command": "up",
            "bundle_path": report.bundle_path.display().to_string(),
            "bundle": entries,
            "empty": report.bundle.empty_keys().iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "warnings": warnings,
        }));
        return;
    }

    output::section("Environment");
    for (key, value) in report.bundle.entries() {
        let shown = if value.is_empty() {
            output::muted("<empty>")
        } else if key.is_secret() {
            mask(value)
        } else {
            output::highlight(value)
        };
        output::field(key.as_str(), shown);
    }

    if report.is_degraded() {
        output::section("Warnings");
        for warning in &report.warnings {
            output::warning(&format!("[{}] {}", warning.stage, warning.message));
        }
        if !report.bundle.is_complete() {
            output::hint("run `stackup keys --write` once the key job has finished");
        }
    }

    output::section("Ready");
    output::success(&format!("Wrote {}", report.bundle_path.display()));
}
