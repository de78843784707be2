//! Fixed-window chunking of raw topic text into passages.

use super::model::Passage;

/// Splits `text` into non-overlapping windows of `tokens_per_passage` whitespace tokens.
///
/// A window size of zero is treated as one token per passage.
pub fn chunk_passages(topic: &str, text: &str, tokens_per_passage: usize) -> Vec<Passage> {
    let window = tokens_per_passage.max(1);
    let tokens: Vec<&str> = text.split_whitespace().collect();

    tokens
        .chunks(window)
        .map(|chunk| Passage::new(topic, chunk.join(" ")))
        .collect()
}
