use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Reasons the credential extractor could not produce a complete key pair.
///
/// These never abort a bootstrap run on their own; the driver downgrades them
/// to warnings and writes whatever was recovered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("master key secret '{secret}' has no value for '{field}'")]
    MissingMasterKey { secret: String, field: String },

    #[error("credentials incomplete, missing: {}", missing.join(", "))]
    IncompleteCredentials { missing: Vec<&'static str> },

    #[error("key listing request failed: {0}")]
    KeyQuery(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("required tool '{tool}' is not available: {hint}")]
    PrereqMissing { tool: String, hint: String },

    #[error("deploy of release '{release}' failed: {reason}")]
    Deploy { release: String, reason: String },

    #[error("{what} not ready after {}s", waited.as_secs())]
    ReadinessTimeout { what: String, waited: Duration },

    #[error("value for {key} cannot be written: {reason}")]
    ValueEncoding { key: String, reason: String },

    #[error("installing '{binary}' failed: {reason}")]
    Install { binary: String, reason: String },

    #[error("pulling model '{model}' failed: {reason}")]
    ModelPull { model: String, reason: String },

    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Stage(Box<crate::domain::StageFailure>),
}

impl From<crate::domain::StageFailure> for Error {
    fn from(failure: crate::domain::StageFailure) -> Self {
        Error::Stage(Box::new(failure))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
