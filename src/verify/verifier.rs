use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::prompt::build_verification_prompt;
use super::verdict::{Verdict, parse_verdict};
use crate::config::Config;
use crate::constants::{DEFAULT_VERIFY_MAX_TOKENS, DEFAULT_VERIFY_MODEL};
use crate::decompose::AtomicClaim;
use crate::llm::ModelGateway;
use crate::storage::Passage;

/// Outcome for one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claim: AtomicClaim,
    pub is_supported: bool,
    /// Model answer as returned; empty when the call failed.
    pub raw_model_output: String,
}

/// Secondary check that can veto a "supported" verdict.
#[async_trait]
pub trait PlausibilityGate: Send + Sync {
    /// Probability in `[0, 1]` that the claim holds, or `None` when unknown.
    async fn probability(&self, topic: &str, claim: &str, evidence: &[Passage]) -> Option<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Supported verdicts whose gate probability falls below this are vetoed.
    pub plausibility_threshold: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VERIFY_MODEL.to_string(),
            max_tokens: DEFAULT_VERIFY_MAX_TOKENS,
            plausibility_threshold: 0.3,
        }
    }
}

impl From<&Config> for VerifierConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.verify_model.clone(),
            max_tokens: config.verify_max_tokens,
            ..Default::default()
        }
    }
}

/// Forced-choice claim verification against retrieved evidence.
#[derive(Clone)]
pub struct Verifier {
    gateway: ModelGateway,
    config: VerifierConfig,
    gate: Option<Arc<dyn PlausibilityGate>>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("gated", &self.gate.is_some())
            .finish_non_exhaustive()
    }
}

impl Verifier {
    pub fn new(gateway: ModelGateway, config: VerifierConfig) -> Self {
        Self {
            gateway,
            config,
            gate: None,
        }
    }

    /// Enables plausibility gating (off by default).
    pub fn with_gate(mut self, gate: Arc<dyn PlausibilityGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verdict plus raw answer for one claim. Never fails: a failed model call
    /// yields `NotSupported` with an empty answer.
    pub async fn judge(&self, topic: &str, claim: &str, evidence: &[Passage]) -> (Verdict, String) {
        let prompt = build_verification_prompt(topic, claim, evidence);

        let answer = match self
            .gateway
            .complete(&prompt, self.config.max_tokens, &self.config.model)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                error!(topic, claim, error = %e, "Verification call failed; claim marked unsupported");
                return (Verdict::NotSupported, String::new());
            }
        };

        let mut verdict = parse_verdict(&answer);

        if verdict.is_supported()
            && let Some(gate) = &self.gate
            && let Some(p) = gate.probability(topic, claim, evidence).await
            && p < self.config.plausibility_threshold
        {
            debug!(topic, claim, probability = p, "Plausibility gate vetoed supported verdict");
            verdict = Verdict::NotSupported;
        }

        (verdict, answer)
    }

    pub async fn verify(&self, topic: &str, claim: AtomicClaim, evidence: &[Passage]) -> VerificationResult {
        let (verdict, raw_model_output) = self.judge(topic, &claim.claim_text, evidence).await;
        VerificationResult {
            claim,
            is_supported: verdict.is_supported(),
            raw_model_output,
        }
    }
}
