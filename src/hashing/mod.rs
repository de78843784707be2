//! Deterministic cache keys and identities.
//!
//! Every key is a BLAKE3 digest over the semantic inputs of a call, with `|`-free
//! length framing so that adjacent fields can never be confused.

use blake3::Hasher;

/// Content-addressed key for one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Wraps a raw 32-byte digest.
    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex form (used as the on-disk key).
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    /// Parses the hex form produced by [`CacheKey::to_hex`].
    pub fn from_hex(hex: &str) -> Option<Self> {
        blake3::Hash::from_hex(hex)
            .ok()
            .map(|h| Self(*h.as_bytes()))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn update_field(hasher: &mut Hasher, field: &[u8]) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field);
}

fn key_from_fields(domain: &str, fields: &[&[u8]]) -> CacheKey {
    let mut hasher = Hasher::new();
    update_field(&mut hasher, domain.as_bytes());
    for field in fields {
        update_field(&mut hasher, field);
    }
    CacheKey(*hasher.finalize().as_bytes())
}

#[inline]
pub fn hash_prompt(prompt: &str) -> [u8; 32] {
    *blake3::hash(prompt.as_bytes()).as_bytes()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for feature hashing and passage identities, where rare collisions only
/// merge two buckets and never corrupt data.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// Key for a cached retrieval result.
pub fn retrieval_key(system: &str, topic: &str, query: &str, k: usize) -> CacheKey {
    key_from_fields(
        "retrieval",
        &[
            system.as_bytes(),
            topic.as_bytes(),
            query.as_bytes(),
            &(k as u64).to_le_bytes(),
        ],
    )
}

/// Key for a built per-topic index. `index_kind` separates lexical from vector indices.
pub fn index_key(index_kind: &str, corpus: &str, topic: &str) -> CacheKey {
    key_from_fields(
        "index",
        &[index_kind.as_bytes(), corpus.as_bytes(), topic.as_bytes()],
    )
}

/// Key for a language-model output. The model id is always part of the key.
pub fn model_call_key(prompt: &str, model: &str, max_tokens: u32) -> CacheKey {
    key_from_fields(
        "model",
        &[
            prompt.as_bytes(),
            model.as_bytes(),
            &max_tokens.to_le_bytes(),
        ],
    )
}

/// Stable passage identity used when fusing rankings across corpora.
pub fn passage_id(title: &str, text: &str) -> u64 {
    let key = key_from_fields("passage", &[title.as_bytes(), text.as_bytes()]);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// File stem for a topic in the passage store.
pub fn topic_file_stem(topic: &str) -> String {
    key_from_fields("topic", &[topic.as_bytes()]).to_hex()
}
