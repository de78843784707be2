//! The three engine caches: retrieval results, built indices, model outputs.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::CacheConfig;
use super::kv::{CacheMode, CacheStats, KvCache};
use crate::index::TopicIndex;
use crate::retrieval::Evidence;

pub const RETRIEVAL_CACHE_NAME: &str = "retrieval";
pub const INDEX_CACHE_NAME: &str = "index";
pub const MODEL_CACHE_NAME: &str = "model";

/// Shared cache handed to every collaborator at construction time.
#[derive(Debug)]
pub struct EngineCache {
    retrieval: KvCache<Evidence>,
    index: KvCache<Arc<TopicIndex>>,
    model: KvCache<String>,
}

/// Stats for all three caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineCacheStats {
    pub retrieval: CacheStats,
    pub index: CacheStats,
    pub model: CacheStats,
}

impl EngineCache {
    pub fn new(config: &CacheConfig) -> Self {
        let mode = match (&config.dir, config.enabled) {
            (_, false) => CacheMode::Disabled,
            (Some(dir), true) => CacheMode::Persistent(dir.clone()),
            (None, true) => CacheMode::Memory,
        };
        Self::with_mode(mode)
    }

    pub fn with_mode(mode: CacheMode) -> Self {
        Self {
            retrieval: KvCache::open(RETRIEVAL_CACHE_NAME, mode.clone()),
            index: KvCache::open(INDEX_CACHE_NAME, mode.clone()),
            model: KvCache::open(MODEL_CACHE_NAME, mode),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_mode(CacheMode::Memory)
    }

    pub fn disabled() -> Self {
        Self::with_mode(CacheMode::Disabled)
    }

    pub fn retrieval(&self) -> &KvCache<Evidence> {
        &self.retrieval
    }

    pub fn index(&self) -> &KvCache<Arc<TopicIndex>> {
        &self.index
    }

    pub fn model(&self) -> &KvCache<String> {
        &self.model
    }

    pub fn stats(&self) -> EngineCacheStats {
        EngineCacheStats {
            retrieval: self.retrieval.stats(),
            index: self.index.stats(),
            model: self.model.stats(),
        }
    }

    /// Flushes all dirty caches. Failures are logged, never returned.
    pub fn flush(&self) -> usize {
        let results = [
            (self.retrieval.name(), self.retrieval.flush()),
            (self.index.name(), self.index.flush()),
            (self.model.name(), self.model.flush()),
        ];

        let mut written = 0;
        for (name, result) in results {
            match result {
                Ok(0) => {}
                Ok(n) => {
                    info!(cache = name, entries = n, "Flushed cache");
                    written += n;
                }
                Err(e) => warn!(cache = name, error = %e, "Cache flush failed; will retry"),
            }
        }
        written
    }
}
