//! Per-claim verification: evidence prompt → True/False answer → [`Verdict`].

pub mod prompt;
pub mod verdict;
pub mod verifier;


pub use prompt::build_verification_prompt;
pub use verdict::{NEGATIVE_KEYWORDS, Verdict, parse_verdict};
pub use verifier::{PlausibilityGate, VerificationResult, Verifier, VerifierConfig};
