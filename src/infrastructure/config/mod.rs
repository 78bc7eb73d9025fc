//! Infrastructure configuration modules.

pub mod bundle;
pub mod cluster;
pub mod inference;
pub mod logging;
pub mod search;
pub mod settings;
