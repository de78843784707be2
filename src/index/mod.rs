//! Per-topic retrieval indices.
//!
//! - [`Bm25Index`] scores lexically (higher is better).
//! - [`VectorIndex`] scores with an [`Embedder`]; direction depends on [`VectorMetric`].
//!
//! Which way a native score sorts is a property of the index family, exposed as
//! [`IndexKind::score_order`], never a global assumption.

pub mod bm25;
mod error;
pub mod tokenize;
pub mod vector;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use bm25::Bm25Index;
pub use error::{EmbeddingError, IndexError, IndexResult};
pub use tokenize::tokenize;
pub use vector::{Embedder, HashingEmbedder, VectorIndex, VectorMetric};

use crate::storage::Passage;

/// Direction in which a native retrieval score improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOrder {
    HigherIsBetter,
    LowerIsBetter,
}

impl ScoreOrder {
    /// Orders `a` before `b` when `a` is the better score.
    #[inline]
    pub fn compare(&self, a: f32, b: f32) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            ScoreOrder::HigherIsBetter => ord.reverse(),
            ScoreOrder::LowerIsBetter => ord,
        }
    }
}

/// Index family used by a retriever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Bm25,
    Vector(VectorMetric),
}

impl IndexKind {
    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::Bm25 => "bm25",
            IndexKind::Vector(VectorMetric::Cosine) => "vector-cosine",
            IndexKind::Vector(VectorMetric::InnerProduct) => "vector-ip",
            IndexKind::Vector(VectorMetric::L2) => "vector-l2",
        }
    }

    pub fn score_order(&self) -> ScoreOrder {
        match self {
            IndexKind::Bm25 => ScoreOrder::HigherIsBetter,
            IndexKind::Vector(VectorMetric::Cosine | VectorMetric::InnerProduct) => {
                ScoreOrder::HigherIsBetter
            }
            IndexKind::Vector(VectorMetric::L2) => ScoreOrder::LowerIsBetter,
        }
    }
}

impl std::str::FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bm25" | "lexical" => Ok(Self::Bm25),
            "vector" | "vector-cosine" | "dense" => Ok(Self::Vector(VectorMetric::Cosine)),
            "vector-ip" => Ok(Self::Vector(VectorMetric::InnerProduct)),
            "vector-l2" => Ok(Self::Vector(VectorMetric::L2)),
            other => Err(format!("Unknown retriever kind: {}", other)),
        }
    }
}

/// A built index of either family.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TopicIndex {
    Bm25(Bm25Index),
    Vector(VectorIndex),
}

impl TopicIndex {
    /// Builds the index for `kind`. Deterministic for a given passage order.
    pub fn build(
        kind: IndexKind,
        passages: &[Passage],
        embedder: Option<&dyn Embedder>,
    ) -> IndexResult<Self> {
        match kind {
            IndexKind::Bm25 => Ok(TopicIndex::Bm25(Bm25Index::build(passages))),
            IndexKind::Vector(metric) => {
                let embedder = embedder.ok_or(IndexError::MissingEmbedder)?;
                Ok(TopicIndex::Vector(VectorIndex::build(
                    passages, embedder, metric,
                )?))
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TopicIndex::Bm25(index) => index.len(),
            TopicIndex::Vector(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One native score per passage.
    pub fn score(&self, query: &str, embedder: Option<&dyn Embedder>) -> IndexResult<Vec<f32>> {
        match self {
            TopicIndex::Bm25(index) => Ok(index.score_text(query)),
            TopicIndex::Vector(index) => {
                let embedder = embedder.ok_or(IndexError::MissingEmbedder)?;
                index.score(query, embedder)
            }
        }
    }
}

/// Returns `(passage_index, score)` for the best `k` scores. Ties keep passage order.
pub fn top_k(scores: &[f32], k: usize, order: ScoreOrder) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| order.compare(a.1, b.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}
