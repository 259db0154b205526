//! Error types for orgscout.
//!
//! Library crates use [`OrgScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all orgscout operations.
#[derive(Debug, thiserror::Error)]
pub enum OrgScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error that the fetch engine did not classify as transient.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or JSON payload did not have the expected structure.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A single organization-data provider or search channel failed.
    #[error("provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A URL had no extractable host where one is required.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Enrichment aborted; wraps whatever escaped the pipeline stages.
    #[error("company data provider failure: {source}")]
    ProviderFailure { source: Box<OrgScoutError> },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OrgScoutError>;

impl OrgScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a provider error tagged with the provider's name.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error into [`OrgScoutError::ProviderFailure`]. Already wrapped
    /// errors are returned unchanged.
    pub fn provider_failure(err: OrgScoutError) -> Self {
        match err {
            Self::ProviderFailure { .. } => err,
            other => Self::ProviderFailure {
                source: Box::new(other),
            },
        }
    }
}
