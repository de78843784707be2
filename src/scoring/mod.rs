//! Factuality scoring: the orchestrator tying decomposition, retrieval and
//! verification together.
//!
//! # Score semantics
//!
//! - Empty text scores `0.0` with the issue `"Empty text"`.
//! - Text with no verifiable claims scores `0.5` (neutral).
//! - An unknown topic scores `0.0`; every claim is reported unsupported.
//! - Otherwise `score = clamp(raw * length_penalty(n, gamma))` where `raw` is
//!   the supported fraction of the `n` claims.
//!
//! Individual model or retrieval failures degrade to "unsupported" for the
//! affected claim; [`FactScorer::score`] itself never returns an error.

pub mod error;
pub mod penalty;
pub mod scorer;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ScoringError;
pub use penalty::{length_penalty, penalized_score};
pub use scorer::{DEFAULT_CORPUS_NAME, FactScorer, FactScorerBuilder};
pub use types::{
    BatchScore, FactualityScore, ISSUE_EMPTY_TEXT, ISSUE_NO_FACTS, ISSUE_NO_PASSAGES,
    ISSUE_TIMED_OUT, UNSUPPORTED_ISSUE_PREFIX,
};
