use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use super::error::ScoringError;
use super::types::{BatchScore, FactualityScore};
use crate::cache::{CacheConfig, CacheFlusher, EngineCache};
use crate::config::Config;
use crate::decompose::{AtomicClaim, Decomposer, DecomposerConfig, DemoPool};
use crate::index::{Embedder, HashingEmbedder, IndexKind};
use crate::llm::{LanguageModel, ModelGateway};
use crate::retrieval::{Evidence, RetrievalConfig, RetrievalSystem};
use crate::retry::RetryPolicy;
use crate::storage::{DiskPassageStore, PassageStore};
use crate::verify::{PlausibilityGate, VerificationResult, Verifier, VerifierConfig};

/// Corpus name used when the builder falls back to the configured passage directory.
pub const DEFAULT_CORPUS_NAME: &str = "passages";

/// Scores generated text against a topic's reference passages.
///
/// Decompose → retrieve → verify → aggregate. Scoring never fails: every
/// degraded path is reported through [`FactualityScore::issues`].
pub struct FactScorer {
    decomposer: Decomposer,
    verifier: Verifier,
    retrieval: Arc<RetrievalSystem>,
    cache: Arc<EngineCache>,
    top_k: usize,
    gamma: usize,
    max_concurrency: usize,
    evaluation_timeout: Option<Duration>,
    flusher: CacheFlusher,
}

impl std::fmt::Debug for FactScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactScorer")
            .field("retrieval", &self.retrieval.name())
            .field("top_k", &self.top_k)
            .field("gamma", &self.gamma)
            .field("max_concurrency", &self.max_concurrency)
            .field("evaluation_timeout", &self.evaluation_timeout)
            .finish()
    }
}

impl FactScorer {
    /// Starts a builder.
    ///
    /// When `build()` runs inside a tokio runtime, the scorer starts its own
    /// background cache flusher. Dropping the scorer, or awaiting
    /// [`FactScorer::shutdown`], stops it and flushes once more. Outside a runtime,
    /// caches persist only on shutdown or drop.
    pub fn builder() -> FactScorerBuilder {
        FactScorerBuilder::default()
    }

    pub fn retrieval(&self) -> &Arc<RetrievalSystem> {
        &self.retrieval
    }

    pub fn cache(&self) -> &Arc<EngineCache> {
        &self.cache
    }

    pub fn gamma(&self) -> usize {
        self.gamma
    }

    pub fn cache_flusher(&self) -> &CacheFlusher {
        &self.flusher
    }

    /// Stops periodic flushing and persists the caches. Later calls return 0.
    pub async fn shutdown(&self) -> usize {
        self.flusher.shutdown().await
    }

    #[instrument(skip(self, text), fields(topic = %topic, text_len = text.len()))]
    pub async fn score(&self, text: &str, topic: &str) -> FactualityScore {
        let result = match self.evaluation_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.evaluate(text, topic)).await {
                Ok(score) => score,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Evaluation timed out");
                    FactualityScore::timed_out()
                }
            },
            None => self.evaluate(text, topic).await,
        };

        info!(
            score = result.score,
            raw_score = result.raw_score,
            num_facts = result.num_facts,
            supported_facts = result.supported_facts,
            "Scored text"
        );
        result
    }

    /// Scores `(text, topic)` pairs. Output order follows input order.
    pub async fn score_batch<S, T>(&self, inputs: &[(S, T)]) -> BatchScore
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let scores: Vec<FactualityScore> = stream::iter(inputs)
            .map(|(text, topic)| self.score(text.as_ref(), topic.as_ref()))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        BatchScore::from_scores(scores)
    }

    async fn evaluate(&self, text: &str, topic: &str) -> FactualityScore {
        if text.trim().is_empty() {
            return FactualityScore::empty_text();
        }

        let claims = self.decomposer.decompose(text).await;
        if claims.is_empty() {
            debug!("No verifiable claims extracted");
            return FactualityScore::no_claims();
        }

        if !self.has_topic(topic).await {
            debug!(num_claims = claims.len(), "Topic has no passages");
            return FactualityScore::missing_topic(claims);
        }

        let details = self.verify_claims(topic, claims).await;
        FactualityScore::from_details(details, self.gamma)
    }

    async fn has_topic(&self, topic: &str) -> bool {
        let retrieval = Arc::clone(&self.retrieval);
        let topic = topic.to_string();
        tokio::task::spawn_blocking(move || retrieval.has_topic(&topic))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Topic lookup task failed");
                false
            })
    }

    async fn retrieve_evidence(&self, topic: &str, claim: &str) -> Evidence {
        let retrieval = Arc::clone(&self.retrieval);
        let topic = topic.to_string();
        let claim = claim.to_string();
        let k = self.top_k;
        tokio::task::spawn_blocking(move || retrieval.retrieve_for_claim(&topic, &claim, k))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Retrieval task failed");
                Evidence::empty()
            })
    }

    async fn verify_claims(&self, topic: &str, claims: Vec<AtomicClaim>) -> Vec<VerificationResult> {
        let mut results: Vec<(usize, VerificationResult)> = stream::iter(claims.into_iter().enumerate())
            .map(|(position, claim)| async move {
                let evidence = self.retrieve_evidence(topic, &claim.claim_text).await;
                let result = self.verifier.verify(topic, claim, &evidence.passages).await;
                (position, result)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.sort_by_key(|(position, _)| *position);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

impl Drop for FactScorer {
    fn drop(&mut self) {
        let written = self.flusher.shutdown_blocking();
        if written > 0 {
            debug!(written, "Flushed caches on drop");
        }
    }
}

/// Assembles a [`FactScorer`] from a [`Config`] plus injected collaborators.
///
/// Only the language model is required. Without corpora the scorer reads a
/// [`DiskPassageStore`] rooted at `config.passage_dir`.
#[derive(Default)]
pub struct FactScorerBuilder {
    config: Config,
    model: Option<Arc<dyn LanguageModel>>,
    retrieval: Option<Arc<RetrievalSystem>>,
    corpora: Vec<Arc<dyn PassageStore>>,
    embedder: Option<Arc<dyn Embedder>>,
    cache: Option<Arc<EngineCache>>,
    gate: Option<Arc<dyn PlausibilityGate>>,
    demos: Option<DemoPool>,
}

impl FactScorerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Adds a corpus. Ignored when a prebuilt retrieval system is supplied.
    pub fn with_corpus(mut self, store: Arc<dyn PassageStore>) -> Self {
        self.corpora.push(store);
        self
    }

    pub fn with_retrieval_system(mut self, retrieval: Arc<RetrievalSystem>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_cache(mut self, cache: Arc<EngineCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_plausibility_gate(mut self, gate: Arc<dyn PlausibilityGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_demos(mut self, demos: DemoPool) -> Self {
        self.demos = Some(demos);
        self
    }

    pub fn build(self) -> Result<FactScorer, ScoringError> {
        let config = self.config;
        config.validate()?;

        let model = self.model.ok_or(ScoringError::MissingModel)?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(EngineCache::new(&CacheConfig::from(&config))));

        let retrieval = match self.retrieval {
            Some(retrieval) => retrieval,
            None => {
                let corpora = if self.corpora.is_empty() {
                    vec![Arc::new(DiskPassageStore::new(
                        DEFAULT_CORPUS_NAME,
                        config.passage_dir.clone(),
                    )) as Arc<dyn PassageStore>]
                } else {
                    self.corpora
                };

                let needs_embedder = config
                    .retrievers
                    .iter()
                    .any(|kind| matches!(kind, IndexKind::Vector(_)));
                let embedder = match self.embedder {
                    Some(embedder) => Some(embedder),
                    None if needs_embedder => {
                        Some(Arc::new(HashingEmbedder::default()) as Arc<dyn Embedder>)
                    }
                    None => None,
                };

                Arc::new(RetrievalSystem::new(
                    RetrievalConfig::from(&config),
                    corpora,
                    embedder,
                    Arc::clone(&cache),
                )?)
            }
        };

        let gateway = ModelGateway::new(
            model,
            Arc::clone(&cache),
            config.max_concurrency,
            RetryPolicy::from(&config),
        );

        let decomposer = Decomposer::with_demos(
            gateway.clone(),
            DecomposerConfig::from(&config),
            self.demos.unwrap_or_default(),
        );

        let mut verifier = Verifier::new(gateway, VerifierConfig::from(&config));
        if let Some(gate) = self.gate {
            verifier = verifier.with_gate(gate);
        }

        info!(
            retrieval = retrieval.name(),
            top_k = config.top_k,
            gamma = config.gamma,
            max_concurrency = config.max_concurrency,
            "Fact scorer ready"
        );

        let flusher = CacheFlusher::new(Arc::clone(&cache), config.flush_interval);
        if tokio::runtime::Handle::try_current().is_ok() {
            let _flush_task = flusher.start();
        } else {
            debug!("No tokio runtime; caches flush on shutdown only");
        }

        Ok(FactScorer {
            decomposer,
            verifier,
            retrieval,
            cache,
            top_k: config.top_k,
            gamma: config.gamma,
            max_concurrency: config.max_concurrency,
            evaluation_timeout: config.evaluation_timeout,
            flusher,
        })
    }
}
