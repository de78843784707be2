use std::path::PathBuf;
use thiserror::Error;

/// Cache I/O failures. Callers log these and degrade to miss / skip-write.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache '{name}': {reason}")]
    Encode { name: String, reason: String },

    #[error("failed to decode cache file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

pub type CacheResult<T> = Result<T, CacheError>;
