//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │  application (bootstrap)  │
//!                 └────────────┬─────────────┘
//!        ┌───────────┬─────────┴──────┬──────────────┐
//!        ▼           ▼                ▼              ▼
//!  ClusterControl  SearchService  InferenceService  HostSystem
//!   (kubectl/helm)  (meilisearch)    (ollama)       (PATH, spawn)
//! ```

pub mod outbound;

pub use outbound::cluster::{ClusterControl, Override, StrayResources};
pub use outbound::host::HostSystem;
pub use outbound::inference::InferenceService;
pub use outbound::progress::{LogReporter, ProgressReporter};
pub use outbound::search::SearchService;
