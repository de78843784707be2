//! Cross-cutting, shared constants.
//!
//! Module-level configs (`DecomposerConfig`, `VerifierConfig`, [`crate::retry::RetryPolicy`])
//! default to these values, and [`crate::config::Config`] uses them as its baseline.

/// Passages retrieved per claim.
pub const DEFAULT_TOP_K: usize = 5;

/// Length-penalty threshold: inputs with fewer claims than this are discounted.
pub const DEFAULT_GAMMA: usize = 10;

/// Upper bound on simultaneously outstanding language-model calls.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Per-call language-model timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Bounded retry count for model and retrieval calls (attempts = retries + 1).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial retry backoff; doubled after every failed attempt.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Reciprocal-rank-fusion smoothing constant.
pub const DEFAULT_RRF_K: f64 = 100.0;

/// Maximum number of claims kept per input text.
pub const DEFAULT_MAX_CLAIMS: usize = 50;

/// Whitespace tokens per stored passage.
pub const DEFAULT_PASSAGE_TOKENS: usize = 256;

/// Interval between background cache flushes.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

pub const DEFAULT_DECOMPOSE_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VERIFY_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_DECOMPOSE_MAX_TOKENS: u32 = 512;
pub const DEFAULT_VERIFY_MAX_TOKENS: u32 = 128;

/// Dimension of the feature-hashing embedder used by the vector retriever.
pub const DEFAULT_EMBEDDING_DIM: usize = 256;

/// Score returned when an input yields no verifiable claims.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Number of unsupported claims surfaced as issues.
pub const MAX_REPORTED_ISSUES: usize = 3;

/// Character limit applied to each reported issue.
pub const MAX_ISSUE_CHARS: usize = 120;
