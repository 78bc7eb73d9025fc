//! Handler for `stackup keys`.

use std::sync::Arc;

use serde_json::json;

use super::command::KeysArgs;
use super::output;
use crate::application::credentials::{CredentialExtractor, Extraction, ExtractionPath};
use crate::domain::mask;
use crate::error::Result;
use crate::infrastructure::bootstrap::{key_sources, plan, Adapters, RunOptions};
use crate::infrastructure::config::settings::Config;

/// Execute `keys`: extract credentials from the running deployment.
///
/// An incomplete result is reported but is not an error.
pub async fn execute(args: &KeysArgs, config: &Config) -> Result<()> {
    let adapters = Adapters::from_config(config)?;
    let extractor = CredentialExtractor::new(
        Arc::clone(&adapters.cluster),
        Arc::clone(&adapters.search),
        key_sources(config),
    );

    let pb = output::spinner("Extracting API keys");
    let extraction = match extractor.extract().await {
        Ok(extraction) => extraction,
        Err(e) => {
            output::spinner_fail(&pb, &e.to_string());
            return Err(e);
        }
    };
    match &extraction {
        Extraction::Complete { path, .. } => {
            output::spinner_success(&pb, &format!("Keys found via {}", describe(*path)));
        }
        Extraction::Failed { cause, .. } => output::spinner_warn(&pb, &cause.to_string()),
    }

    let credentials = extraction.into_credentials();
    let shown = |value: &str| {
        if args.reveal {
            value.to_string()
        } else {
            mask(value)
        }
    };

    let written = if args.write {
        let plan = plan(config, RunOptions::default());
        let endpoint = adapters
            .cluster
            .service_endpoint(&config.search.service)
            .await?;
        plan.write_bundle(&endpoint, &credentials)?;
        Some(plan.bundle_path.display().to_string())
    } else {
        None
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "keys",
            "complete": credentials.is_complete(),
            "search_key": shown(credentials.search_key()),
            "admin_key": shown(credentials.admin_key()),
            "missing": credentials.missing(),
            "written": written,
        }));
        return Ok(());
    }

    output::section("Keys");
    output::field("Search key", shown(credentials.search_key()));
    output::field("Admin key", shown(credentials.admin_key()));
    if let Some(path) = written {
        output::success(&format!("Wrote {path}"));
    }
    if !credentials.is_complete() {
        output::hint(&format!("kubectl logs job/{}", config.keys.job));
    }
    Ok(())
}

fn describe(path: ExtractionPath) -> &'static str {
    match path {
        ExtractionPath::Secret => "secret",
        ExtractionPath::DirectQuery => "key API",
    }
}
