//! One index family over one corpus.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{RetrievalError, RetrievalResult};
use super::evidence::Evidence;
use crate::cache::EngineCache;
use crate::hashing::index_key;
use crate::index::{Embedder, IndexKind, TopicIndex, top_k};
use crate::retry::{RetryPolicy, retry_blocking};
use crate::storage::{Passage, PassageStore};

/// Lazily builds and queries per-topic indices of one [`IndexKind`] over one corpus.
///
/// Built indices are memoized in the engine's index cache, so each topic is
/// indexed at most once per process (and reloaded from disk across restarts).
#[derive(Clone)]
pub struct Retriever {
    kind: IndexKind,
    store: Arc<dyn PassageStore>,
    embedder: Option<Arc<dyn Embedder>>,
    cache: Arc<EngineCache>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("kind", &self.kind)
            .field("corpus", &self.store.name())
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(
        kind: IndexKind,
        store: Arc<dyn PassageStore>,
        embedder: Option<Arc<dyn Embedder>>,
        cache: Arc<EngineCache>,
        retry: RetryPolicy,
    ) -> RetrievalResult<Self> {
        if matches!(kind, IndexKind::Vector(_)) && embedder.is_none() {
            return Err(RetrievalError::InvalidConfig {
                reason: format!("{} retriever requires an embedder", kind.name()),
            });
        }
        Ok(Self {
            kind,
            store,
            embedder,
            cache,
            retry,
        })
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn corpus(&self) -> &str {
        self.store.name()
    }

    /// Looks up the topic's passages, retrying transient store failures.
    pub fn passages(&self, topic: &str) -> RetrievalResult<Option<Arc<[Passage]>>> {
        retry_blocking(&self.retry, "passage_lookup", || self.store.get_passages(topic)).map_err(
            |e| RetrievalError::StoreExhausted {
                attempts: e.attempts,
                last: e.last.to_string(),
            },
        )
    }

    pub fn has_topic(&self, topic: &str) -> RetrievalResult<bool> {
        if topic.trim().is_empty() {
            return Ok(false);
        }
        Ok(self.passages(topic)?.is_some())
    }

    /// Ranked passages per query, each list at most `k` long.
    ///
    /// An empty topic, an unknown topic or an empty query yields empty evidence.
    pub fn retrieve(&self, topic: &str, queries: &[String], k: usize) -> RetrievalResult<Vec<Evidence>> {
        let empty = || vec![Evidence::empty(); queries.len()];
        if topic.trim().is_empty() || k == 0 {
            return Ok(empty());
        }

        let Some(passages) = self.passages(topic)? else {
            debug!(topic, corpus = self.corpus(), "Topic not in corpus");
            return Ok(empty());
        };

        let index = self.index_for(topic, &passages)?;
        let embedder = self.embedder.as_deref();
        let order = self.kind.score_order();

        queries
            .iter()
            .map(|query| -> RetrievalResult<Evidence> {
                if query.trim().is_empty() {
                    return Ok(Evidence::empty());
                }
                let scores = index.score(query, embedder)?;
                Ok(top_k(&scores, k, order)
                    .into_iter()
                    .map(|(i, score)| (passages[i].clone(), score))
                    .collect())
            })
            .collect()
    }

    fn index_for(&self, topic: &str, passages: &[Passage]) -> RetrievalResult<Arc<TopicIndex>> {
        let key = index_key(self.kind.name(), self.store.name(), topic);
        let embedder = self.embedder.as_deref();

        let index = self
            .cache
            .index()
            .get_or_try_insert_with(key, || {
                debug!(topic, kind = self.kind.name(), passages = passages.len(), "Building index");
                TopicIndex::build(self.kind, passages, embedder).map(Arc::new)
            })
            .map_err(RetrievalError::Index)?;

        if index.len() == passages.len() {
            return Ok(index);
        }

        // A persisted index no longer matches the corpus; build a fresh one for this call.
        warn!(
            topic,
            cached = index.len(),
            stored = passages.len(),
            "Cached index out of sync with passage store; rebuilding"
        );
        Ok(Arc::new(TopicIndex::build(self.kind, passages, embedder)?))
    }
}
