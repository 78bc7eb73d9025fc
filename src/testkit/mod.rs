//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`fakes`] - In-memory implementations of every outbound port.
//! - [`config`] - Canonical test configurations with short waits.
//! - [`harness`] - A bootstrap driver wired to the fakes.

pub mod config;
pub mod fakes;
pub mod harness;
