use serde::{Deserialize, Serialize};

use super::penalty::penalized_score;
use crate::constants::{MAX_ISSUE_CHARS, MAX_REPORTED_ISSUES, NEUTRAL_SCORE};
use crate::decompose::AtomicClaim;
use crate::verify::VerificationResult;

pub const ISSUE_EMPTY_TEXT: &str = "Empty text";
pub const ISSUE_NO_FACTS: &str = "No verifiable facts found";
pub const ISSUE_NO_PASSAGES: &str = "No passages found for topic";
pub const ISSUE_TIMED_OUT: &str = "Evaluation timed out";
pub const UNSUPPORTED_ISSUE_PREFIX: &str = "Unsupported claim: ";

/// Result of scoring one `(text, topic)` pair.
///
/// `num_facts == details.len()` and `supported_facts` counts supported details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactualityScore {
    /// Final score in `[0, 1]`, length penalty applied.
    pub score: f64,
    /// `supported_facts / num_facts` before the penalty (0 when there are no facts).
    pub raw_score: f64,
    pub num_facts: usize,
    pub supported_facts: usize,
    /// One entry per claim, in claim order.
    pub details: Vec<VerificationResult>,
    pub issues: Vec<String>,
}

impl FactualityScore {
    fn terminal(score: f64, issue: &str) -> Self {
        Self {
            score,
            raw_score: 0.0,
            num_facts: 0,
            supported_facts: 0,
            details: Vec::new(),
            issues: vec![issue.to_string()],
        }
    }

    pub fn empty_text() -> Self {
        Self::terminal(0.0, ISSUE_EMPTY_TEXT)
    }

    /// Nothing to verify is neutral, not false.
    pub fn no_claims() -> Self {
        Self::terminal(NEUTRAL_SCORE, ISSUE_NO_FACTS)
    }

    pub fn timed_out() -> Self {
        Self::terminal(0.0, ISSUE_TIMED_OUT)
    }

    /// Claims exist but the topic has no passages: every claim is unsupported.
    pub fn missing_topic(claims: Vec<AtomicClaim>) -> Self {
        let details: Vec<VerificationResult> = claims
            .into_iter()
            .map(|claim| VerificationResult {
                claim,
                is_supported: false,
                raw_model_output: String::new(),
            })
            .collect();

        Self {
            score: 0.0,
            raw_score: 0.0,
            num_facts: details.len(),
            supported_facts: 0,
            details,
            issues: vec![ISSUE_NO_PASSAGES.to_string()],
        }
    }

    /// Aggregates verified claims and applies the length penalty.
    pub fn from_details(details: Vec<VerificationResult>, gamma: usize) -> Self {
        let num_facts = details.len();
        if num_facts == 0 {
            return Self::no_claims();
        }

        let supported_facts = details.iter().filter(|d| d.is_supported).count();
        let raw_score = supported_facts as f64 / num_facts as f64;
        let score = penalized_score(raw_score, num_facts, gamma);

        let issues = details
            .iter()
            .filter(|d| !d.is_supported)
            .take(MAX_REPORTED_ISSUES)
            .map(|d| unsupported_issue(&d.claim.claim_text))
            .collect();

        Self {
            score,
            raw_score,
            num_facts,
            supported_facts,
            details,
            issues,
        }
    }

    /// `true` when at least one claim was extracted.
    pub fn responded(&self) -> bool {
        self.num_facts > 0
    }
}

impl std::fmt::Display for FactualityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "score {:.4} ({}/{} supported, raw {:.4})",
            self.score, self.supported_facts, self.num_facts, self.raw_score
        )
    }
}

fn unsupported_issue(claim: &str) -> String {
    let mut text: String = claim.chars().take(MAX_ISSUE_CHARS).collect();
    if claim.chars().count() > MAX_ISSUE_CHARS {
        text.push_str("...");
    }
    format!("{}{}", UNSUPPORTED_ISSUE_PREFIX, text)
}

/// Aggregate over many scored inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchScore {
    pub mean_score: f64,
    pub mean_raw_score: f64,
    /// Fraction of inputs that yielded at least one claim.
    pub respond_ratio: f64,
    pub mean_num_facts: f64,
    pub scores: Vec<FactualityScore>,
}

impl BatchScore {
    pub fn from_scores(scores: Vec<FactualityScore>) -> Self {
        if scores.is_empty() {
            return Self {
                mean_score: 0.0,
                mean_raw_score: 0.0,
                respond_ratio: 0.0,
                mean_num_facts: 0.0,
                scores,
            };
        }

        let n = scores.len() as f64;
        let mean = |f: fn(&FactualityScore) -> f64| scores.iter().map(f).sum::<f64>() / n;

        Self {
            mean_score: mean(|s| s.score),
            mean_raw_score: mean(|s| s.raw_score),
            respond_ratio: mean(|s| if s.responded() { 1.0 } else { 0.0 }),
            mean_num_facts: mean(|s| s.num_facts as f64),
            scores,
        }
    }
}
