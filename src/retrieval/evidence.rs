use serde::{Deserialize, Serialize};

use crate::storage::Passage;

/// Ranked passages retrieved for one query, best first.
///
/// `passages` and `scores` always have the same length. Scores are native index
/// scores for a single retriever and fused RRF scores otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub passages: Vec<Passage>,
    pub scores: Vec<f32>,
}

impl Evidence {
    pub fn new(passages: Vec<Passage>, scores: Vec<f32>) -> Self {
        debug_assert_eq!(passages.len(), scores.len());
        Self { passages, scores }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Passage, f32)> {
        self.passages.iter().zip(self.scores.iter().copied())
    }

    pub fn truncate(&mut self, k: usize) {
        self.passages.truncate(k);
        self.scores.truncate(k);
    }
}

impl FromIterator<(Passage, f32)> for Evidence {
    fn from_iter<I: IntoIterator<Item = (Passage, f32)>>(iter: I) -> Self {
        let (passages, scores) = iter.into_iter().unzip();
        Self { passages, scores }
    }
}
