//! Reciprocal Rank Fusion: score = Σ 1/(rrf_k + rank + 1), rank 0-based.
//!
//! Merges ranked lists from different retrievers without normalizing their
//! native scores against each other.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::index::ScoreOrder;
use crate::storage::Passage;

/// A passage after fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedPassage {
    pub passage: Passage,
    /// Accumulated RRF score (higher = more relevant).
    pub rrf_score: f64,
}

/// Contribution of a 0-based rank.
#[inline]
pub fn rrf_contribution(rank: usize, rrf_k: f64) -> f64 {
    1.0 / (rrf_k + rank as f64 + 1.0)
}

/// Fuses ranked lists by passage identity and keeps the best `k`.
///
/// Ties are broken by first appearance across the lists, so the result is
/// deterministic for a given input order.
pub fn fuse_ranked_lists(ranked_lists: &[Vec<Passage>], rrf_k: f64, k: usize) -> Vec<FusedPassage> {
    let mut slots: HashMap<u64, usize> = HashMap::new();
    let mut fused: Vec<FusedPassage> = Vec::new();

    for list in ranked_lists {
        for (rank, passage) in list.iter().enumerate() {
            let contribution = rrf_contribution(rank, rrf_k);
            match slots.get(&passage.id()) {
                Some(&slot) => fused[slot].rrf_score += contribution,
                None => {
                    slots.insert(passage.id(), fused.len());
                    fused.push(FusedPassage {
                        passage: passage.clone(),
                        rrf_score: contribution,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-appearance order among equal scores.
    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(Ordering::Equal)
    });
    fused.truncate(k);
    fused
}

/// Concatenates one retriever's per-corpus results and re-ranks them by native score.
pub fn merge_corpora(per_corpus: Vec<Vec<(Passage, f32)>>, order: ScoreOrder) -> Vec<Passage> {
    let mut merged: Vec<(Passage, f32)> = per_corpus.into_iter().flatten().collect();
    merged.sort_by(|a, b| order.compare(a.1, b.1));
    merged.into_iter().map(|(passage, _)| passage).collect()
}
