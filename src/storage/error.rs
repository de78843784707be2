use std::path::PathBuf;
use thiserror::Error;

use crate::storage::mmap::MmapError;

/// Errors raised by a passage store.
///
/// A topic that is simply absent is not an error; stores return `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum PassageStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mmap error: {0}")]
    Mmap(#[from] MmapError),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The archive exists but does not belong to the requested topic.
    #[error("corrupt passage archive at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("storage path unavailable: {path}")]
    StorageUnavailable { path: PathBuf },

    /// Backend temporarily unreachable (retryable).
    #[error("passage store unavailable: {reason}")]
    Unavailable { reason: String },
}

pub type PassageStoreResult<T> = Result<T, PassageStoreError>;
