//! Handler for `stackup down`.

use std::sync::Arc;

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use serde_json::json;

use super::command::DownArgs;
use super::output;
use crate::error::Result;
use crate::infrastructure::bootstrap::{driver, Adapters, RunOptions};
use crate::infrastructure::config::settings::Config;
use crate::port::LogReporter;

/// Execute `down`: uninstall the release and delete stray resources.
pub async fn execute(args: &DownArgs, config: &Config) -> Result<()> {
    let driver = driver(
        config,
        RunOptions::default(),
        Adapters::from_config(config)?,
        Arc::new(LogReporter),
    );
    let plan = driver.plan();

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Remove release '{}' from namespace '{}'?",
                plan.release, config.cluster.namespace
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::note("Nothing removed.");
            return Ok(());
        }
    }

    let pb = output::spinner(&format!("Removing {}", plan.release));
    if let Err(e) = driver.teardown().await {
        output::spinner_fail(&pb, &e.to_string());
        return Err(e);
    }
    output::spinner_success(&pb, &format!("Removed {}", plan.release));

    if output::is_json() {
        output::json_output(json!({
            "command": "down",
            "release": plan.release,
            "jobs": plan.stray.jobs,
            "secrets": plan.stray.secrets,
        }));
    } else {
        for job in &plan.stray.jobs {
            output::field("Job", job);
        }
        for secret in &plan.stray.secrets {
            output::field("Secret", secret);
        }
    }
    Ok(())
}
