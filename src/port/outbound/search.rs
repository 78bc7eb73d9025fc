//! Search-service port.

use async_trait::async_trait;

use crate::domain::{ApiKey, MasterKey, ServiceEndpoint};
use crate::error::Result;

/// The parts of the search service's HTTP API the bootstrap uses.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// `GET /health` returned success.
    async fn is_healthy(&self, endpoint: &ServiceEndpoint) -> bool;

    /// List API keys using the master key as a bearer token.
    async fn list_keys(&self, endpoint: &ServiceEndpoint, master: &MasterKey)
        -> Result<Vec<ApiKey>>;
}
