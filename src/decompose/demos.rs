//! Worked decomposition examples and similarity-based selection.

use crate::index::bm25::{DEFAULT_B, DEFAULT_K1};
use crate::index::{Bm25Index, ScoreOrder, tokenize, top_k};

/// One worked example: a sentence and its atomic facts.
///
/// An example without facts demonstrates the "no verifiable claim" answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demo {
    pub sentence: String,
    pub facts: Vec<String>,
}

impl Demo {
    pub fn new(sentence: &str, facts: &[&str]) -> Self {
        Self {
            sentence: sentence.to_string(),
            facts: facts.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Fixed examples that open every prompt, plus a pool searched with BM25.
#[derive(Debug, Clone)]
pub struct DemoPool {
    fixed: Vec<Demo>,
    pool: Vec<Demo>,
    index: Bm25Index,
}

impl Default for DemoPool {
    fn default() -> Self {
        Self::new(builtin_fixed(), builtin_pool())
    }
}

impl DemoPool {
    pub fn new(fixed: Vec<Demo>, pool: Vec<Demo>) -> Self {
        let docs: Vec<Vec<String>> = pool.iter().map(|d| tokenize(&d.sentence)).collect();
        let index = Bm25Index::from_token_docs(&docs, DEFAULT_K1, DEFAULT_B);
        Self { fixed, pool, index }
    }

    pub fn fixed(&self) -> &[Demo] {
        &self.fixed
    }

    pub fn pool(&self) -> &[Demo] {
        &self.pool
    }

    /// First `num_fixed` fixed examples, then the `num_similar` pool examples
    /// lexically closest to `sentence` (ties keep pool order).
    pub fn select(&self, sentence: &str, num_fixed: usize, num_similar: usize) -> Vec<&Demo> {
        let scores = self.index.score(&tokenize(sentence));
        let similar = top_k(&scores, num_similar, ScoreOrder::HigherIsBetter);

        self.fixed
            .iter()
            .take(num_fixed)
            .chain(similar.into_iter().map(|(i, _)| &self.pool[i]))
            .collect()
    }
}

fn builtin_fixed() -> Vec<Demo> {
    vec![Demo::new(
        "Marie Curie was a Polish-born physicist who won the Nobel Prize in Physics in 1903 and the Nobel Prize in Chemistry in 1911.",
        &[
            "Marie Curie was a physicist.",
            "Marie Curie was born in Poland.",
            "Marie Curie won the Nobel Prize in Physics.",
            "Marie Curie won the Nobel Prize in Physics in 1903.",
            "Marie Curie won the Nobel Prize in Chemistry.",
            "Marie Curie won the Nobel Prize in Chemistry in 1911.",
        ],
    )]
}

fn builtin_pool() -> Vec<Demo> {
    vec![
        Demo::new(
            "The Amazon River flows through Peru, Colombia and Brazil before emptying into the Atlantic Ocean.",
            &[
                "The Amazon River flows through Peru.",
                "The Amazon River flows through Colombia.",
                "The Amazon River flows through Brazil.",
                "The Amazon River empties into the Atlantic Ocean.",
            ],
        ),
        Demo::new(
            "The Eiffel Tower, completed in 1889, was the tallest man-made structure in the world for 41 years.",
            &[
                "The Eiffel Tower was completed in 1889.",
                "The Eiffel Tower was the tallest man-made structure in the world.",
                "The Eiffel Tower was the tallest man-made structure in the world for 41 years.",
            ],
        ),
        Demo::new(
            "Python is a programming language created by Guido van Rossum and first released in 1991.",
            &[
                "Python is a programming language.",
                "Python was created by Guido van Rossum.",
                "Python was first released in 1991.",
            ],
        ),
        Demo::new(
            "Water boils at 100 degrees Celsius at sea level, but it boils at a lower temperature at high altitude.",
            &[
                "Water boils at 100 degrees Celsius at sea level.",
                "Water boils at a lower temperature at high altitude.",
            ],
        ),
        Demo::new(
            "The leaves of most plants look green because chlorophyll absorbs red and blue light.",
            &[
                "The leaves of most plants look green.",
                "Chlorophyll absorbs red light.",
                "Chlorophyll absorbs blue light.",
                "The leaves of most plants look green because of chlorophyll.",
            ],
        ),
        Demo::new(
            "Beethoven composed nine symphonies, although he was almost completely deaf when he wrote the last one.",
            &[
                "Beethoven composed nine symphonies.",
                "Beethoven was almost completely deaf when he wrote his last symphony.",
            ],
        ),
        Demo::new(
            "The Great Barrier Reef, located off the coast of Queensland, is the largest coral reef system on Earth.",
            &[
                "The Great Barrier Reef is located off the coast of Queensland.",
                "The Great Barrier Reef is a coral reef system.",
                "The Great Barrier Reef is the largest coral reef system on Earth.",
            ],
        ),
        Demo::new("I'm sorry to hear that you are feeling this way today.", &[]),
        Demo::new(
            "Thanks for asking, and let me know if there is anything else I can help you with.",
            &[],
        ),
    ]
}
