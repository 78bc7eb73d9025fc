//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the bootstrap's external dependencies: the
//! cluster control plane, the search and inference HTTP APIs, and the local
//! host.

pub mod cluster;
pub mod host;
pub mod inference;
pub mod progress;
pub mod search;
