//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A count or duration that must be non-zero was zero.
    #[error("{name} must be greater than zero")]
    MustBePositive { name: &'static str },

    #[error("at least one retriever must be configured")]
    NoRetrievers,

    #[error("model identifier must not be empty")]
    EmptyModel,

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
