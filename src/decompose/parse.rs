//! Parsing of decomposition answers.

use std::sync::LazyLock;

use regex::Regex;

static ENUMERATION_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]+\s*|\(?\d{1,3}[.):]\s+|\(?[a-z][.)]\s+)").ok());

static META_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:sure\b|certainly\b|okay\b|of course\b|here (?:is|are)\b|i'?m sorry\b|i am sorry\b|i apologi[sz]e\b|as an ai\b|note\b|the following\b|please breakdown\b|independent facts\b|facts?\s*:|output\s*:|sentence\s*:)",
    )
    .ok()
});

static NO_CLAIM: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\bno (?:verifiable|factual|checkable) (?:claims?|facts?)\b").ok()
});

/// Result of parsing one decomposition answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedClaims {
    /// Claims extracted from dash-prefixed lines.
    Dashed(Vec<String>),
    /// Claims recovered by the permissive line parser.
    Fallback(Vec<String>),
    /// The model stated that the sentence has nothing to verify.
    NoClaim,
    /// Nothing usable in the answer.
    Empty,
}

impl ParsedClaims {
    pub fn into_claims(self) -> Vec<String> {
        match self {
            ParsedClaims::Dashed(claims) | ParsedClaims::Fallback(claims) => claims,
            ParsedClaims::NoClaim | ParsedClaims::Empty => Vec::new(),
        }
    }
}

fn is_no_claim(line: &str) -> bool {
    NO_CLAIM.as_ref().is_some_and(|re| re.is_match(line))
}

fn has_content(line: &str) -> bool {
    line.chars().any(char::is_alphanumeric)
}

fn is_meta(line: &str) -> bool {
    line.ends_with(':') || META_LINE.as_ref().is_some_and(|re| re.is_match(line))
}

fn strip_enumeration(line: &str) -> &str {
    match ENUMERATION_MARKER.as_ref().and_then(|re| re.find(line)) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Extracts claims: dash-prefixed lines first, then a permissive pass that strips
/// enumeration markers and skips meta lines ("Here are the facts:", apologies, ...).
pub fn parse_claims(answer: &str) -> ParsedClaims {
    let dashed: Vec<String> = answer
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(str::trim)
        .filter(|claim| has_content(claim) && !is_no_claim(claim))
        .map(str::to_string)
        .collect();
    if !dashed.is_empty() {
        return ParsedClaims::Dashed(dashed);
    }

    if is_no_claim(answer) {
        return ParsedClaims::NoClaim;
    }

    let fallback: Vec<String> = answer
        .lines()
        .map(|line| strip_enumeration(line.trim()).trim())
        .filter(|line| has_content(line) && !is_meta(line))
        .map(str::to_string)
        .collect();
    if fallback.is_empty() {
        ParsedClaims::Empty
    } else {
        ParsedClaims::Fallback(fallback)
    }
}
