//! A bootstrap driver wired to fakes.

use std::sync::Arc;

use crate::application::bootstrap::BootstrapDriver;
use crate::infrastructure::bootstrap::{driver, Adapters, RunOptions};
use crate::infrastructure::config::settings::Config;

use super::fakes::{FakeCluster, FakeHost, FakeInference, FakeSearch, RecordingReporter};

/// Fakes for every port, kept around for assertions after a run.
pub struct Harness {
    pub cluster: Arc<FakeCluster>,
    pub search: Arc<FakeSearch>,
    pub inference: Arc<FakeInference>,
    pub host: Arc<FakeHost>,
    pub reporter: Arc<RecordingReporter>,
}

impl Harness {
    /// Healthy fakes with `kubectl`, `helm` and `ollama` on `PATH` and both
    /// default models already pulled.
    pub fn new() -> Self {
        Self {
            cluster: Arc::new(FakeCluster::new()),
            search: Arc::new(FakeSearch::new()),
            inference: Arc::new(FakeInference::with_models(&[
                "llama3.2:latest",
                "all-minilm:latest",
            ])),
            host: Arc::new(FakeHost::with_executables(&["kubectl", "helm", "ollama"])),
            reporter: Arc::new(RecordingReporter::new()),
        }
    }

    /// Have the key job write a complete key pair to the API key secret.
    pub fn with_secret_keys(self, search: &str, admin: &str) -> Self {
        self.cluster
            .set_job_output("meilisearch-api-keys", "MEILI_SEARCH_KEY", search);
        self.cluster
            .set_job_output("meilisearch-api-keys", "MEILI_ADMIN_KEY", admin);
        self
    }

    /// Store the master key the direct key query authenticates with.
    pub fn with_master_key(self, master: &str) -> Self {
        self.cluster
            .set_secret("meilisearch-master-key", "MEILI_MASTER_KEY", master);
        self
    }

    pub fn driver(&self, config: &Config, options: RunOptions) -> BootstrapDriver {
        let adapters = Adapters {
            cluster: self.cluster.clone(),
            search: self.search.clone(),
            inference: self.inference.clone(),
            host: self.host.clone(),
        };
        driver(config, options, adapters, self.reporter.clone())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
