//! Named composition of retrievers over one or more corpora.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{RetrievalError, RetrievalResult};
use super::evidence::Evidence;
use super::fusion::{fuse_ranked_lists, merge_corpora};
use super::retriever::Retriever;
use crate::cache::EngineCache;
use crate::config::Config;
use crate::constants::DEFAULT_RRF_K;
use crate::hashing::retrieval_key;
use crate::index::{Embedder, IndexKind};
use crate::retry::RetryPolicy;
use crate::storage::PassageStore;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Index families; more than one enables rank fusion.
    pub kinds: Vec<IndexKind>,
    pub rrf_k: f64,
    pub retry: RetryPolicy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            kinds: vec![IndexKind::Bm25],
            rrf_k: DEFAULT_RRF_K,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&Config> for RetrievalConfig {
    fn from(config: &Config) -> Self {
        Self {
            kinds: config.retrievers.clone(),
            rrf_k: config.rrf_k,
            retry: RetryPolicy::from(config),
        }
    }
}

impl RetrievalConfig {
    /// Stable name of the configuration, e.g. `bm25` or `bm25+vector-cosine`.
    pub fn name(&self) -> String {
        self.kinds
            .iter()
            .map(IndexKind::name)
            .collect::<Vec<_>>()
            .join("+")
    }
}

/// Retrievers of one family, one per corpus.
#[derive(Debug, Clone)]
struct RetrieverGroup {
    kind: IndexKind,
    retrievers: Vec<Retriever>,
}

/// The evidence source used by the scorer.
///
/// Results are cached under the configuration name plus every corpus name, so
/// two systems over different corpora never share entries.
#[derive(Debug, Clone)]
pub struct RetrievalSystem {
    name: String,
    rrf_k: f64,
    groups: Vec<RetrieverGroup>,
    cache: Arc<EngineCache>,
}

impl RetrievalSystem {
    pub fn new(
        config: RetrievalConfig,
        corpora: Vec<Arc<dyn PassageStore>>,
        embedder: Option<Arc<dyn Embedder>>,
        cache: Arc<EngineCache>,
    ) -> RetrievalResult<Self> {
        if config.kinds.is_empty() {
            return Err(RetrievalError::InvalidConfig {
                reason: "no retriever kinds configured".to_string(),
            });
        }
        if corpora.is_empty() {
            return Err(RetrievalError::InvalidConfig {
                reason: "no corpus configured".to_string(),
            });
        }

        let groups = config
            .kinds
            .iter()
            .map(|&kind| {
                let retrievers = corpora
                    .iter()
                    .map(|store| {
                        Retriever::new(
                            kind,
                            Arc::clone(store),
                            embedder.clone(),
                            Arc::clone(&cache),
                            config.retry,
                        )
                    })
                    .collect::<RetrievalResult<Vec<_>>>()?;
                Ok(RetrieverGroup { kind, retrievers })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        let corpus_names: Vec<&str> = corpora.iter().map(|store| store.name()).collect();
        let name = format!("{}@{}", config.name(), corpus_names.join(","));

        Ok(Self {
            name,
            rrf_k: config.rrf_k,
            groups,
            cache,
        })
    }

    /// Single BM25 retriever over one corpus.
    pub fn bm25(store: Arc<dyn PassageStore>, cache: Arc<EngineCache>) -> RetrievalResult<Self> {
        Self::new(RetrievalConfig::default(), vec![store], None, cache)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rrf_k(&self) -> f64 {
        self.rrf_k
    }

    fn is_single(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].retrievers.len() == 1
    }

    fn all_retrievers(&self) -> impl Iterator<Item = &Retriever> {
        self.groups.iter().flat_map(|g| g.retrievers.iter())
    }

    /// `true` if any corpus holds passages for `topic`. Store failures count as absent.
    pub fn has_topic(&self, topic: &str) -> bool {
        if topic.trim().is_empty() {
            return false;
        }

        // Every family shares the same corpora, so the first group suffices.
        self.groups[0].retrievers.iter().any(|retriever| {
            retriever.has_topic(topic).unwrap_or_else(|e| {
                warn!(topic, corpus = retriever.corpus(), error = %e, "Topic probe failed");
                false
            })
        })
    }

    /// Evidence for one claim, queried as `"{topic} {claim}"`.
    pub fn retrieve_for_claim(&self, topic: &str, claim: &str, k: usize) -> Evidence {
        if topic.trim().is_empty() || claim.trim().is_empty() {
            return Evidence::empty();
        }
        let query = format!("{} {}", topic.trim(), claim.trim());
        self.retrieve(topic, &[query], k)
            .pop()
            .unwrap_or_default()
    }

    /// One ranked list (length ≤ `k`) per query.
    ///
    /// Never fails: retriever errors are logged and degrade to empty evidence,
    /// which is then not cached.
    pub fn retrieve(&self, topic: &str, queries: &[String], k: usize) -> Vec<Evidence> {
        let mut results = vec![Evidence::empty(); queries.len()];
        if topic.trim().is_empty() || k == 0 {
            return results;
        }

        let mut misses: Vec<usize> = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            if query.trim().is_empty() {
                continue;
            }
            let key = retrieval_key(&self.name, topic, query, k);
            match self.cache.retrieval().get(&key) {
                Some(hit) => results[i] = hit,
                None => misses.push(i),
            }
        }
        if misses.is_empty() {
            return results;
        }

        let miss_queries: Vec<String> = misses.iter().map(|&i| queries[i].clone()).collect();
        let (computed, degraded) = self.compute(topic, &miss_queries, k);

        for (&i, evidence) in misses.iter().zip(computed) {
            if !degraded {
                let key = retrieval_key(&self.name, topic, &queries[i], k);
                self.cache.retrieval().insert(key, evidence.clone());
            }
            results[i] = evidence;
        }
        results
    }

    /// Runs every retriever and fuses. Returns `(evidence, degraded)`.
    fn compute(&self, topic: &str, queries: &[String], k: usize) -> (Vec<Evidence>, bool) {
        let mut degraded = false;
        let mut run = |retriever: &Retriever| -> Vec<Evidence> {
            match retriever.retrieve(topic, queries, k) {
                Ok(lists) => lists,
                Err(e) => {
                    warn!(
                        topic,
                        kind = retriever.kind().name(),
                        corpus = retriever.corpus(),
                        error = %e,
                        "Retrieval failed; continuing with empty evidence"
                    );
                    degraded = true;
                    vec![Evidence::empty(); queries.len()]
                }
            }
        };

        if self.is_single() {
            let evidence = run(&self.groups[0].retrievers[0]);
            return (evidence, degraded);
        }

        // per_group[g][c][q]: group g, corpus c, query q.
        let per_group: Vec<(IndexKind, Vec<Vec<Evidence>>)> = self
            .groups
            .iter()
            .map(|group| (group.kind, group.retrievers.iter().map(&mut run).collect()))
            .collect();

        let fused = (0..queries.len())
            .map(|q| {
                let ranked_lists: Vec<_> = per_group
                    .iter()
                    .map(|(kind, per_corpus)| {
                        let lists = per_corpus
                            .iter()
                            .map(|lists| lists[q].iter().map(|(p, s)| (p.clone(), s)).collect())
                            .collect();
                        merge_corpora(lists, kind.score_order())
                    })
                    .collect();

                fuse_ranked_lists(&ranked_lists, self.rrf_k, k)
                    .into_iter()
                    .map(|f| (f.passage, f.rrf_score as f32))
                    .collect::<Evidence>()
            })
            .collect();

        debug!(
            topic,
            retrievers = self.all_retrievers().count(),
            queries = queries.len(),
            "Fused retrieval results"
        );
        (fused, degraded)
    }
}
