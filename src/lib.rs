//! Stackup - local search and inference environment bootstrapper.
//!
//! Deploys Meilisearch into a Kubernetes cluster with `helm`, makes sure a
//! local Ollama runtime is installed and serving the required models, waits
//! for everything to become ready, recovers the search API keys and writes a
//! `.env` bundle for downstream applications.
//!
//! # Architecture
//!
//! The crate is laid out hexagonally:
//!
//! - [`domain`] - Targets, endpoints, credentials, bundles and run stages
//! - [`port`] - Traits for the cluster, the search and inference APIs, the
//!   host and progress reporting
//! - [`application`] - Readiness polling, credential extraction, bundle
//!   persistence, the runtime installer and the bootstrap driver
//! - [`adapter`] - `kubectl`/`helm`, HTTP clients, host processes and the CLI
//! - [`infrastructure`] - Configuration and the composition root
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stackup::infrastructure::bootstrap::{driver, Adapters, RunOptions};
//! use stackup::infrastructure::config::settings::Config;
//! use stackup::port::LogReporter;
//!
//! # async fn run() -> stackup::error::Result<()> {
//! let config = Config::load_or_default("stackup.toml")?;
//! let adapters = Adapters::from_config(&config)?;
//! let report = driver(&config, RunOptions::default(), adapters, Arc::new(LogReporter))
//!     .run()
//!     .await?;
//! println!("wrote {}", report.bundle_path.display());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
