use std::sync::Arc;
use thiserror::Error;

use crate::index::IndexError;
use crate::storage::PassageStoreError;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("passage store error: {0}")]
    Store(#[from] PassageStoreError),

    /// Passage lookup kept failing after bounded retries.
    #[error("passage lookup failed after {attempts} attempts: {last}")]
    StoreExhausted { attempts: u32, last: String },

    #[error("index error: {0}")]
    Index(Arc<IndexError>),

    /// The retrieval system was configured without any retriever or corpus.
    #[error("invalid retrieval configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<IndexError> for RetrievalError {
    fn from(e: IndexError) -> Self {
        RetrievalError::Index(Arc::new(e))
    }
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
