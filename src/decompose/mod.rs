//! Claim decomposition.
//!
//! Text → sentences (with repair) → one few-shot prompt per substantive
//! sentence → dash-line parse with a permissive fallback → deduplicated claims.

pub mod decomposer;
pub mod demos;
pub mod parse;
pub mod prompt;
pub mod sentences;


pub use decomposer::{AtomicClaim, Decomposer, DecomposerConfig};
pub use demos::{Demo, DemoPool};
pub use parse::{ParsedClaims, parse_claims};
pub use prompt::{DECOMPOSE_INSTRUCTION, NO_CLAIM_ANSWER, build_decomposition_prompt};
pub use sentences::{split_sentences, split_sentences_without};
