//! Dense vector index with a pluggable [`Embedder`].

use half::f16;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EmbeddingError, IndexError, IndexResult};
use super::tokenize::tokenize;
use crate::hashing::hash_to_u64;
use crate::storage::Passage;

/// Produces fixed-size dense vectors for text.
pub trait Embedder: Send + Sync {
    fn embedding_dim(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Signed feature-hashing embedder over lower-cased tokens.
///
/// Deterministic and model-free: two texts sharing vocabulary land close in
/// cosine space.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self, EmbeddingError> {
        if dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be > 0".to_string(),
            });
        }
        Ok(Self { dim })
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: crate::constants::DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embedding = vec![0.0f32; self.dim];
        for token in tokenize(text) {
            let h = hash_to_u64(token.as_bytes());
            let bucket = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }
        Ok(normalize(embedding))
    }
}

fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}

/// Similarity metric; it also fixes the direction of the native score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VectorMetric {
    /// Cosine similarity, higher is better.
    #[default]
    Cosine,
    /// Raw dot product, higher is better.
    InnerProduct,
    /// Euclidean distance, lower is better.
    L2,
}

/// Per-topic dense index. Passage vectors are stored as `f16`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    metric: VectorMetric,
    /// Row-major `f16` bit patterns, `len * dim` values.
    vectors: Vec<u16>,
}

impl VectorIndex {
    pub fn build(
        passages: &[Passage],
        embedder: &dyn Embedder,
        metric: VectorMetric,
    ) -> IndexResult<Self> {
        let dim = embedder.embedding_dim();
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts)?;

        let mut vectors = Vec::with_capacity(passages.len() * dim);
        for embedding in embeddings {
            if embedding.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    actual: embedding.len(),
                });
            }
            let halves: Vec<f16> = embedding.iter().map(|&v| f16::from_f32(v)).collect();
            vectors.extend_from_slice(bytemuck::cast_slice::<f16, u16>(&halves));
        }

        debug!(passages = passages.len(), dim, ?metric, "Built vector index");
        Ok(Self {
            dim,
            metric,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.vectors.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metric(&self) -> VectorMetric {
        self.metric
    }

    fn row(&self, i: usize) -> &[f16] {
        let bits = &self.vectors[i * self.dim..(i + 1) * self.dim];
        bytemuck::cast_slice::<u16, f16>(bits)
    }

    /// One native score per passage, in passage order.
    pub fn score(&self, query: &str, embedder: &dyn Embedder) -> IndexResult<Vec<f32>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let q = embedder.embed(query)?;
        if q.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: q.len(),
            });
        }

        Ok((0..self.len())
            .map(|i| {
                let row = self.row(i);
                match self.metric {
                    VectorMetric::Cosine => cosine_similarity_f16_f32(row, &q),
                    VectorMetric::InnerProduct => dot_f16_f32(row, &q),
                    VectorMetric::L2 => l2_distance_f16_f32(row, &q),
                }
            })
            .collect())
    }
}

#[inline]
fn dot_f16_f32(a: &[f16], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(av, bv)| av.to_f32() * bv).sum()
}

#[inline]
pub fn cosine_similarity_f16_f32(a: &[f16], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (av, &bv)| {
                let av = av.to_f32();
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[inline]
fn l2_distance_f16_f32(a: &[f16], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(av, bv)| {
            let d = av.to_f32() - bv;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
