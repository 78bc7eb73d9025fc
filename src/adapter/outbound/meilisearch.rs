//! Meilisearch HTTP client.
//!
//! Implements [`SearchService`] against the Meilisearch REST API: the
//! unauthenticated `/health` check and the master-key protected `/keys`
//! listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{ApiKey, MasterKey, ServiceEndpoint};
use crate::error::Result;
use crate::port::outbound::search::SearchService;

/// Meilisearch API client.
#[derive(Debug, Clone)]
pub struct Meilisearch {
    client: Client,
    health_path: String,
}

impl Meilisearch {
    /// Create a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(health_path: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            health_path: health_path.into(),
        })
    }
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    results: Vec<ApiKey>,
}

#[async_trait]
impl SearchService for Meilisearch {
    async fn is_healthy(&self, endpoint: &ServiceEndpoint) -> bool {
        let url = endpoint.join(&self.health_path);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Health check failed");
                false
            }
        }
    }

    async fn list_keys(&self, endpoint: &ServiceEndpoint, master: &MasterKey) -> Result<Vec<ApiKey>> {
        let list = self
            .client
            .get(endpoint.join("/keys"))
            .bearer_auth(master.expose())
            .send()
            .await?
            .error_for_status()?
            .json::<KeyList>()
            .await?;
        debug!(count = list.results.len(), "Listed API keys");
        Ok(list.results)
    }
}
