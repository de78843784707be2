use serde::{Deserialize, Serialize};

/// Binary support label for one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Supported,
    NotSupported,
}

impl Verdict {
    #[inline]
    pub fn is_supported(self) -> bool {
        matches!(self, Verdict::Supported)
    }
}

impl From<bool> for Verdict {
    fn from(supported: bool) -> Self {
        if supported {
            Verdict::Supported
        } else {
            Verdict::NotSupported
        }
    }
}

/// Words that turn an answer without "true"/"false" into a rejection.
pub const NEGATIVE_KEYWORDS: &[&str] = &["not", "cannot", "unknown", "information"];

/// Parses a free-text True/False answer.
///
/// Precedence: when both "true" and "false" occur, the later occurrence wins;
/// a single one wins alone; otherwise the answer counts as supported unless it
/// contains one of [`NEGATIVE_KEYWORDS`] as a whole word (punctuation removed).
pub fn parse_verdict(answer: &str) -> Verdict {
    let lower = answer.to_lowercase();

    match (lower.rfind("true"), lower.rfind("false")) {
        (Some(t), Some(f)) => Verdict::from(t > f),
        (Some(_), None) => Verdict::Supported,
        (None, Some(_)) => Verdict::NotSupported,
        (None, None) => {
            let stripped: String = lower.chars().filter(|c| !c.is_ascii_punctuation()).collect();
            let negative = stripped
                .split_whitespace()
                .any(|word| NEGATIVE_KEYWORDS.contains(&word));
            Verdict::from(!negative)
        }
    }
}
