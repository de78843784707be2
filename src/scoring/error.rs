use thiserror::Error;

use crate::config::ConfigError;
use crate::retrieval::RetrievalError;

/// Construction-time failures. Scoring itself never fails.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("no language model configured")]
    MissingModel,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("retrieval setup failed: {0}")]
    Retrieval(#[from] RetrievalError),
}
