//! Composition root: builds adapters and the run plan from configuration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::adapter::outbound::host::ProcessHost;
use crate::adapter::outbound::kube::KubeCli;
use crate::adapter::outbound::meilisearch::Meilisearch;
use crate::adapter::outbound::ollama::Ollama;
use crate::application::bootstrap::{BootstrapDriver, BootstrapPlan, InferencePlan};
use crate::application::credentials::KeySources;
use crate::domain::ServiceEndpoint;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{
    ClusterControl, HostSystem, InferenceService, Override, ProgressReporter, SearchService,
    StrayResources,
};

/// Per-invocation switches that are not part of the configuration file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Keep an existing release instead of uninstalling it first.
    pub keep_existing: bool,
    /// Leave the local inference runtime alone.
    pub skip_inference: bool,
}

/// Concrete adapters for a configuration.
pub struct Adapters {
    pub cluster: Arc<dyn ClusterControl>,
    pub search: Arc<dyn SearchService>,
    pub inference: Arc<dyn InferenceService>,
    pub host: Arc<dyn HostSystem>,
}

impl Adapters {
    /// Build the real adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cluster = KubeCli::new(
            &config.cluster.kubectl,
            &config.cluster.helm,
            &config.cluster.namespace,
            config.cluster.context.clone(),
            &config.cluster.node_host,
        );
        let search = Meilisearch::new(
            &config.search.health_path,
            Duration::from_secs(config.search.request_timeout_secs),
        )?;
        let inference = Ollama::new(
            &config.inference.health_path,
            Duration::from_secs(config.inference.request_timeout_secs),
        )?;
        Ok(Self {
            cluster: Arc::new(cluster),
            search: Arc::new(search),
            inference: Arc::new(inference),
            host: Arc::new(ProcessHost::new()),
        })
    }
}

/// Chart overrides: configured values, plus the dev-mode key file location.
#[must_use]
pub fn overrides(config: &Config) -> Vec<Override> {
    let mut overrides: Vec<Override> = config
        .cluster
        .overrides
        .iter()
        .map(|(key, value)| Override::new(key, value))
        .collect();
    if config.bundle.dev_mode {
        overrides.push(Override::new("devMode", "true"));
        overrides.push(Override::new(
            "localSecretPath",
            config.bundle.local_key_path.display().to_string(),
        ));
    }
    overrides
}

/// Secret and key names the credential extractor reads.
#[must_use]
pub fn key_sources(config: &Config) -> KeySources {
    KeySources {
        secret: config.keys.secret.clone(),
        search_field: config.keys.search_field.clone(),
        admin_field: config.keys.admin_field.clone(),
        master_secret: config.keys.master_secret.clone(),
        master_field: config.keys.master_field.clone(),
        service: config.search.service.clone(),
        search_key_name: config.keys.search_key_name.clone(),
        admin_key_name: config.keys.admin_key_name.clone(),
    }
}

/// Secret manifest seeding the master key, when one is configured.
///
/// Rendered as JSON, which `kubectl apply` accepts as YAML.
#[must_use]
pub fn master_key_manifest(config: &Config) -> Option<String> {
    let key = config.keys.master_key.as_deref()?;
    if key.trim().is_empty() {
        return None;
    }
    let mut data = serde_json::Map::new();
    data.insert(config.keys.master_field.clone(), json!(key));
    Some(
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "type": "Opaque",
            "metadata": {
                "name": config.keys.master_secret,
                "namespace": config.cluster.namespace,
            },
            "stringData": data,
        })
        .to_string(),
    )
}

/// Resolve everything a run needs from configuration.
#[must_use]
pub fn plan(config: &Config, options: RunOptions) -> BootstrapPlan {
    let mut stray_secrets = vec![config.keys.secret.clone()];
    stray_secrets.extend(config.cluster.extra_secrets.iter().cloned());

    let inference = (config.inference.enabled && !options.skip_inference).then(|| InferencePlan {
        target: config.inference_target(),
        install_command: config.inference.install_command.clone(),
        start_command: config.inference.start_command.clone(),
        models: vec![
            config.inference.model.clone(),
            config.inference.embedding_model.clone(),
        ]
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect(),
    });

    let plan = BootstrapPlan {
        required_tools: vec![config.cluster.kubectl.clone(), config.cluster.helm.clone()],
        release: config.cluster.release.clone(),
        chart: config.cluster.chart.clone(),
        overrides: overrides(config),
        manifests: master_key_manifest(config).into_iter().collect(),
        stray: StrayResources {
            jobs: vec![config.keys.job.clone()],
            secrets: stray_secrets,
        },
        search: config.search_target(),
        job: config.keys.job.clone(),
        job_timeout: Duration::from_secs(config.keys.job_timeout_secs),
        job_poll_interval: Duration::from_secs(config.keys.job_poll_interval_secs),
        keys: key_sources(config),
        inference,
        inference_endpoint: ServiceEndpoint::local(config.inference.port),
        model: config.inference.model.clone(),
        embedding_model: config.inference.embedding_model.clone(),
        bundle_path: config.bundle.path.clone(),
        local_key_path: config
            .bundle
            .dev_mode
            .then(|| config.bundle.local_key_path.clone()),
        skip_teardown: options.keep_existing,
    };
    debug!(release = %plan.release, chart = %plan.chart, "Plan resolved");
    plan
}

/// Wire a driver from configuration and a set of adapters.
#[must_use]
pub fn driver(
    config: &Config,
    options: RunOptions,
    adapters: Adapters,
    reporter: Arc<dyn ProgressReporter>,
) -> BootstrapDriver {
    BootstrapDriver::new(
        adapters.cluster,
        adapters.search,
        adapters.inference,
        adapters.host,
        reporter,
        plan(config, options),
    )
}
