//! Ollama HTTP client.
//!
//! Implements [`InferenceService`] over the local Ollama API. Pulls are
//! requested with `stream: false`, so the call returns only once the model
//! is fully downloaded; the client timeout is sized accordingly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ServiceEndpoint;
use crate::error::{Error, Result};
use crate::port::outbound::inference::InferenceService;

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct Ollama {
    client: Client,
    health_path: String,
}

impl Ollama {
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
struct Tags {
    #[serde(default)]
    models: Vec<Model>,
}

#[derive(Deserialize)]
struct Model {
    name: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl InferenceService for Ollama {
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

    async fn list_models(&self, endpoint: &ServiceEndpoint) -> Result<Vec<String>> {
        let tags = self
            .client
            .get(endpoint.join("/api/tags"))
            .send()
            .await?
            .error_for_status()?
            .json::<Tags>()
            .await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn pull_model(&self, endpoint: &ServiceEndpoint, model: &str) -> Result<()> {
        let response = self
            .client
            .post(endpoint.join("/api/pull"))
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<PullResponse>()
            .await?;

        if let Some(error) = response.error {
            return Err(Error::ModelPull {
                model: model.to_string(),
                reason: error,
            });
        }
        if response.status != "success" {
            return Err(Error::ModelPull {
                model: model.to_string(),
                reason: format!("pull ended with status '{}'", response.status),
            });
        }
        debug!(model, "Pull finished");
        Ok(())
    }
}
