//! Okapi BM25 over one topic's passages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::tokenize::tokenize;
use crate::storage::Passage;

pub const DEFAULT_K1: f32 = 1.5;
pub const DEFAULT_B: f32 = 0.75;

/// Lexical index; higher scores are more relevant.
///
/// IDF uses `ln(1 + (N - n + 0.5) / (n + 0.5))`, which stays positive even for
/// terms present in every passage (single-passage topics are common).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bm25Index {
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
    idf: HashMap<String, f32>,
    k1: f32,
    b: f32,
}

impl Bm25Index {
    pub fn build(passages: &[Passage]) -> Self {
        Self::build_with_params(passages, DEFAULT_K1, DEFAULT_B)
    }

    pub fn build_with_params(passages: &[Passage], k1: f32, b: f32) -> Self {
        let docs: Vec<Vec<String>> = passages.iter().map(|p| tokenize(&p.text)).collect();
        Self::from_token_docs(&docs, k1, b)
    }

    /// Builds over pre-tokenized documents (also used for demonstration selection).
    pub fn from_token_docs(docs: &[Vec<String>], k1: f32, b: f32) -> Self {
        let mut term_freqs = Vec::with_capacity(docs.len());
        let mut doc_lens = Vec::with_capacity(docs.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for doc in docs {
            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in doc {
                *tf.entry(token.clone()).or_default() += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            doc_lens.push(doc.len() as u32);
            term_freqs.push(tf);
        }

        let n = docs.len() as f32;
        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            doc_lens.iter().map(|&l| l as f32).sum::<f32>() / n
        };

        let idf = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f32;
                (term, (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        Self {
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
            k1,
            b,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_lens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lens.is_empty()
    }

    /// One score per indexed passage, in passage order.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.len()];
        if self.avg_doc_len == 0.0 {
            return scores;
        }

        for token in query_tokens {
            let Some(&idf) = self.idf.get(token) else {
                continue;
            };

            for (i, tf) in self.term_freqs.iter().enumerate() {
                let Some(&freq) = tf.get(token) else {
                    continue;
                };
                let freq = freq as f32;
                let norm = 1.0 - self.b + self.b * self.doc_lens[i] as f32 / self.avg_doc_len;
                scores[i] += idf * (freq * (self.k1 + 1.0)) / (freq + self.k1 * norm);
            }
        }

        scores
    }

    pub fn score_text(&self, query: &str) -> Vec<f32> {
        self.score(&tokenize(query))
    }
}
