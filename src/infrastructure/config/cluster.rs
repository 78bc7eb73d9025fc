//! Cluster control-plane configuration.
//!
//! Names the release to install, the chart it comes from, and how the
//! `kubectl`/`helm` binaries reach the cluster.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Settings for the release and the tools that manage it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// `kubectl` executable. Defaults to "kubectl" on `PATH`.
    pub kubectl: String,

    /// `helm` executable. Defaults to "helm" on `PATH`.
    pub helm: String,

    /// Namespace the release and its resources live in.
    pub namespace: String,

    /// Optional kube context; the current context is used when unset.
    pub context: Option<String>,

    /// Release name.
    pub release: String,

    /// Chart reference: a local path or `repo/chart`.
    pub chart: String,

    /// Host used to reach NodePort services.
    ///
    /// Defaults to "localhost", which suits kind, k3d and Docker Desktop.
    pub node_host: String,

    /// Extra `--set key=value` overrides for the chart, applied in key order.
    pub overrides: BTreeMap<String, String>,

    /// Secrets deleted on teardown in addition to the key secret.
    pub extra_secrets: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            helm: "helm".to_string(),
            namespace: "default".to_string(),
            context: None,
            release: "devstack".to_string(),
            chart: "./charts/devstack".to_string(),
            node_host: "localhost".to_string(),
            overrides: BTreeMap::new(),
            extra_secrets: Vec::new(),
        }
    }
}
