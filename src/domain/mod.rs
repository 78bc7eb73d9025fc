//! Provisioning domain types: targets, endpoints, credentials, bundles, stages.

mod bundle;
mod credential;
mod stage;
mod target;

pub use bundle::{BundleKey, EnvironmentBundle};
pub use credential::{mask, ApiKey, CredentialSet, MasterKey, ADMIN_KEY_FIELD, SEARCH_KEY_FIELD};
pub use stage::{Stage, StageFailure, Warning};
pub use target::{DeploymentTarget, ServiceEndpoint, TargetLocation};
