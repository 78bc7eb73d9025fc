//! Inference-service port.

use async_trait::async_trait;

use crate::domain::ServiceEndpoint;
use crate::error::Result;

/// The parts of the inference runtime's HTTP API the installer uses.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// The model listing endpoint answered with success.
    async fn is_healthy(&self, endpoint: &ServiceEndpoint) -> bool;

    /// Names of locally available models.
    async fn list_models(&self, endpoint: &ServiceEndpoint) -> Result<Vec<String>>;

    /// Fetch a model and block until the pull finishes.
    async fn pull_model(&self, endpoint: &ServiceEndpoint, model: &str) -> Result<()>;
}
