//! Atomic-fact verification engine.
//!
//! Breaks generated text into atomic claims, retrieves evidence for each claim
//! from a topic-keyed passage store, asks a language model whether the evidence
//! supports the claim, and aggregates the verdicts into a length-penalized
//! factuality score.
//!
//! # Public API Surface
//!
//! ## Entry point
//! - [`FactScorer`], [`FactScorerBuilder`], [`FactualityScore`], [`BatchScore`]
//! - [`Config`], [`ConfigError`] - Environment-backed settings
//!
//! ## Pipeline stages
//! - [`Decomposer`], [`AtomicClaim`] - Few-shot claim extraction
//! - [`RetrievalSystem`], [`Retriever`], [`Evidence`] - BM25/vector retrieval with rank fusion
//! - [`Verifier`], [`VerificationResult`] - Evidence-conditioned True/False judgment
//!
//! ## Infrastructure
//! - [`PassageStore`], [`DiskPassageStore`] - Topic passages
//! - [`EngineCache`], [`CacheFlusher`] - Retrieval, index and model caches
//! - [`LanguageModel`], [`GenaiModel`], [`ModelGateway`] - Model access
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod decompose;
pub mod hashing;
pub mod index;
pub mod llm;
pub mod retrieval;
pub mod retry;
pub mod scoring;
pub mod storage;
pub mod verify;

pub use cache::{CacheConfig, CacheError, CacheFlusher, CacheMode, EngineCache, KvCache};
pub use config::{Config, ConfigError};
pub use decompose::{AtomicClaim, Decomposer, DecomposerConfig, DemoPool};
pub use hashing::{CacheKey, hash_to_u64};
pub use index::{Bm25Index, Embedder, HashingEmbedder, IndexError, IndexKind, VectorIndex, VectorMetric};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockLanguageModel;
pub use llm::{GenaiModel, LanguageModel, LlmError, ModelGateway};
pub use retrieval::{Evidence, RetrievalConfig, RetrievalError, RetrievalSystem, Retriever};
pub use retry::RetryPolicy;
pub use scoring::{
    BatchScore, FactScorer, FactScorerBuilder, FactualityScore, ScoringError, length_penalty,
};
#[cfg(any(test, feature = "mock"))]
pub use storage::MemoryPassageStore;
pub use storage::{DiskPassageStore, Passage, PassageStore, PassageStoreError, chunk_passages};
pub use verify::{PlausibilityGate, Verdict, VerificationResult, Verifier, VerifierConfig};
