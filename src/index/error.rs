use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid embedder config: {reason}")]
    InvalidConfig { reason: String },

    #[error("embedding failed: {reason}")]
    InferenceFailed { reason: String },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector index requires an embedder")]
    MissingEmbedder,

    #[error("dimension mismatch: index has {expected}, embedder produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type IndexResult<T> = Result<T, IndexError>;
