//! Handler for `stackup env`.

use serde_json::json;

use super::command::EnvArgs;
use super::output;
use crate::application::environment;
use crate::domain::{mask, BundleKey};
use crate::error::Result;

/// Execute `env`: print a bundle file, masking secrets unless `--reveal`.
pub fn execute(args: &EnvArgs) -> Result<()> {
    let pairs = environment::read(&args.path)?;
    let shown: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(key, value)| {
            let secret = BundleKey::from_name(&key).is_some_and(BundleKey::is_secret);
            let value = if secret && !args.reveal {
                mask(&value)
            } else {
                value
            };
            (key, value)
        })
        .collect();

    if output::is_json() {
        let map: serde_json::Map<String, serde_json::Value> = shown
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect();
        output::json_output(json!({
            "command": "env",
            "path": args.path.display().to_string(),
            "entries": map,
        }));
        return Ok(());
    }

    output::section(&args.path.display().to_string());
    for (key, value) in &shown {
        output::field(key, value);
    }
    Ok(())
}
