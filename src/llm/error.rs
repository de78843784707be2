use std::time::Duration;
use thiserror::Error;

/// Failure of a `complete(prompt, max_tokens, model)` call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// Retries exhausted; `last` describes the final failure.
    #[error("model call failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("model gateway closed")]
    Closed,
}
