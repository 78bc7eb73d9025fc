//! Cluster control-plane port.
//!
//! Abstracts the orchestration API (releases, pods, jobs, services, secrets)
//! so the bootstrap sequence can run against a fake in tests.

use async_trait::async_trait;

use crate::domain::ServiceEndpoint;
use crate::error::Result;

/// A single `key=value` override passed to a release install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub value: String,
}

impl Override {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Named resources removed alongside a release.
///
/// Jobs and the secrets they write outlive `helm uninstall`, so teardown
/// deletes them explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrayResources {
    pub jobs: Vec<String>,
    pub secrets: Vec<String>,
}

/// Declarative operations against the cluster control plane.
///
/// # Errors
///
/// Methods return an error only for genuine control-plane failures. Absence
/// of a resource is reported through the return value (`false`, empty
/// string), never as an error.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Remove a release and the listed stray resources. Idempotent.
    async fn teardown(&self, release: &str, stray: &StrayResources) -> Result<()>;

    /// Install or upgrade a release from a chart with overrides.
    async fn deploy(&self, release: &str, chart: &str, overrides: &[Override]) -> Result<()>;

    /// Apply an ad-hoc manifest.
    async fn apply_manifest(&self, manifest: &str) -> Result<()>;

    /// Resolve the externally reachable endpoint of a service.
    async fn service_endpoint(&self, service: &str) -> Result<ServiceEndpoint>;

    /// Read and decode one field of a secret; empty when absent.
    async fn secret_field(&self, secret: &str, field: &str) -> Result<String>;

    /// True when at least one pod matches and all matching pods are ready.
    async fn pods_ready(&self, selector: &str) -> Result<bool>;

    /// True when the job reports a `Complete` condition.
    async fn job_complete(&self, job: &str) -> Result<bool>;

    /// Log output of a job's pod, for diagnostics.
    async fn job_logs(&self, job: &str) -> Result<String>;
}
