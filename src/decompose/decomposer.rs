use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::demos::DemoPool;
use super::parse::{ParsedClaims, parse_claims};
use super::prompt::build_decomposition_prompt;
use super::sentences::split_sentences_without;
use crate::config::Config;
use crate::constants::{
    DEFAULT_DECOMPOSE_MAX_TOKENS, DEFAULT_DECOMPOSE_MODEL, DEFAULT_MAX_CLAIMS,
    DEFAULT_MAX_CONCURRENCY,
};
use crate::llm::ModelGateway;

/// One minimal, independently verifiable statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtomicClaim {
    pub source_sentence: String,
    pub claim_text: String,
    /// 0-based position within the source sentence.
    pub claim_id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecomposerConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Sentences shorter than this (in characters) are skipped.
    pub min_sentence_chars: usize,
    /// Lower-case prefixes of sentences that never carry facts.
    pub skip_prefixes: Vec<String>,
    pub max_claims: usize,
    pub num_fixed_demos: usize,
    pub num_similar_demos: usize,
    /// Sentences decomposed concurrently.
    pub parallelism: usize,
}

const DEFAULT_SKIP_PREFIXES: &[&str] = &[
    "sorry",
    "i'm sorry",
    "i am sorry",
    "i apologize",
    "as an ai",
    "thank you",
    "thanks for",
    "let me know",
    "feel free",
    "i hope this helps",
];

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_DECOMPOSE_MODEL.to_string(),
            max_tokens: DEFAULT_DECOMPOSE_MAX_TOKENS,
            min_sentence_chars: 8,
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|s| s.to_string()).collect(),
            max_claims: DEFAULT_MAX_CLAIMS,
            num_fixed_demos: 1,
            num_similar_demos: 2,
            parallelism: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl From<&Config> for DecomposerConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.decompose_model.clone(),
            max_tokens: config.decompose_max_tokens,
            max_claims: config.max_claims,
            parallelism: config.max_concurrency,
            ..Default::default()
        }
    }
}

/// Splits text into atomic claims with one few-shot model call per sentence.
#[derive(Debug, Clone)]
pub struct Decomposer {
    gateway: ModelGateway,
    config: DecomposerConfig,
    demos: Arc<DemoPool>,
}

impl Decomposer {
    pub fn new(gateway: ModelGateway, config: DecomposerConfig) -> Self {
        Self::with_demos(gateway, config, DemoPool::default())
    }

    pub fn with_demos(gateway: ModelGateway, config: DecomposerConfig, demos: DemoPool) -> Self {
        Self {
            gateway,
            config,
            demos: Arc::new(demos),
        }
    }

    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    /// `true` for sentences worth sending to the model.
    pub fn is_substantive(&self, sentence: &str) -> bool {
        let trimmed = sentence.trim();
        if trimmed.chars().count() < self.config.min_sentence_chars {
            return false;
        }
        !self.has_skip_prefix(trimmed)
    }

    fn has_skip_prefix(&self, sentence: &str) -> bool {
        let lower = sentence.trim().to_lowercase();
        self.config
            .skip_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }

    /// Claim texts only, in claim order.
    pub async fn decompose_text(&self, text: &str) -> Vec<String> {
        self.decompose(text)
            .await
            .into_iter()
            .map(|claim| claim.claim_text)
            .collect()
    }

    /// Decomposes `text` into deduplicated claims, at most `max_claims`.
    ///
    /// Sentences are processed concurrently; claims come back in sentence order.
    /// A failed model call or an unparseable answer contributes no claims.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn decompose(&self, text: &str) -> Vec<AtomicClaim> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let sentences: Vec<String> = split_sentences_without(text, |s| self.has_skip_prefix(s))
            .into_iter()
            .filter(|s| self.is_substantive(s))
            .collect();
        if sentences.is_empty() {
            debug!("No substantive sentences");
            return Vec::new();
        }

        let per_sentence: Vec<(String, Vec<String>)> = stream::iter(sentences)
            .map(|sentence| async move {
                let claims = self.decompose_sentence(&sentence).await;
                (sentence, claims)
            })
            .buffered(self.config.parallelism.max(1))
            .collect()
            .await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut claims = Vec::new();
        'sentences: for (sentence, texts) in per_sentence {
            let mut claim_id = 0;
            for text in texts {
                if !seen.insert(dedup_key(&text)) {
                    continue;
                }
                if claims.len() >= self.config.max_claims {
                    warn!(max_claims = self.config.max_claims, "Claim cap reached; dropping the rest");
                    break 'sentences;
                }
                claims.push(AtomicClaim {
                    source_sentence: sentence.clone(),
                    claim_text: text,
                    claim_id,
                });
                claim_id += 1;
            }
        }

        debug!(num_claims = claims.len(), "Decomposed text");
        claims
    }

    async fn decompose_sentence(&self, sentence: &str) -> Vec<String> {
        let demos = self.demos.select(
            sentence,
            self.config.num_fixed_demos,
            self.config.num_similar_demos,
        );
        let prompt = build_decomposition_prompt(sentence, &demos);

        let answer = match self
            .gateway
            .complete(&prompt, self.config.max_tokens, &self.config.model)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, sentence, "Decomposition call failed; sentence skipped");
                return Vec::new();
            }
        };

        match parse_claims(&answer) {
            ParsedClaims::Dashed(claims) => claims,
            ParsedClaims::Fallback(claims) => {
                debug!(sentence, "Used permissive decomposition parser");
                claims
            }
            ParsedClaims::NoClaim => Vec::new(),
            ParsedClaims::Empty => {
                warn!(sentence, "Decomposition answer had no extractable claims");
                Vec::new()
            }
        }
    }
}

/// Case, whitespace and trailing-punctuation insensitive identity of a claim.
fn dedup_key(claim: &str) -> String {
    claim
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '!', ';'])
        .to_lowercase()
}
