//! Miette-based diagnostics for configuration files.
//!
//! Renders a TOML error with the offending file content, a labeled span and
//! an optional help line.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(stackup::config))]
pub struct ConfigDiagnostic {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    /// Build a diagnostic for `len` bytes at `offset` in `src`.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        name: impl AsRef<str>,
        src: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            src: NamedSource::new(name, src.into()),
            span: (offset, len).into(),
            help: None,
        }
    }

    /// From a TOML parse error, if it carries a span.
    #[must_use]
    pub fn from_toml(error: &toml::de::Error, name: impl AsRef<str>, src: &str) -> Option<Self> {
        let span = error.span()?;
        Some(Self::new(
            error.message().to_string(),
            name,
            src,
            span.start,
            span.end.saturating_sub(span.start),
        ))
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}
