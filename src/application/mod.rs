//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the bootstrap.

pub mod bootstrap;
pub mod credentials;
pub mod environment;
pub mod installer;
pub mod poll;
