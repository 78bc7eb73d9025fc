//! Outbound adapters (driven side).

pub mod host;
pub mod kube;
pub mod meilisearch;
pub mod ollama;
