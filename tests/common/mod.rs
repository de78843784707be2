//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use atomfact::decompose::DECOMPOSE_INSTRUCTION;
use atomfact::{
    Config, DiskPassageStore, EngineCache, FactScorer, MockLanguageModel, Passage, PassageStore,
};
use tempfile::TempDir;

pub const COLOR_PASSAGES: &[&str] = &[
    "Color is the visual perception of light. The sky appears blue because of Rayleigh scattering.",
    "Grass is green because its cells contain chlorophyll.",
    "Blood is red because of hemoglobin.",
];

/// Sentence targeted by a decomposition prompt.
pub fn target_sentence(prompt: &str) -> &str {
    prompt
        .trim_end()
        .lines()
        .last()
        .and_then(|line| line.strip_prefix(DECOMPOSE_INSTRUCTION))
        .map(str::trim)
        .unwrap_or_default()
}

/// Claim under test in a verification prompt.
pub fn verification_claim(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Input: ")?.strip_suffix(" True or False?"))
}

/// Model that answers True when the claim's words all occur in the prompt's evidence.
///
/// Decomposition echoes each sentence as a single claim; sentences starting with
/// "I feel" produce no claims.
pub fn evidence_model() -> MockLanguageModel {
    MockLanguageModel::new(|prompt, _| match verification_claim(prompt) {
        Some(claim) => {
            let context = prompt.to_lowercase();
            let supported = claim
                .trim_end_matches('.')
                .split_whitespace()
                .all(|word| context.matches(&word.to_lowercase()).count() > 1);
            Ok(if supported { "True" } else { "False" }.to_string())
        }
        None => {
            let sentence = target_sentence(prompt);
            if sentence.starts_with("I feel") {
                Ok("No verifiable claim.".to_string())
            } else {
                Ok(format!("- {}", sentence))
            }
        }
    })
}

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<DiskPassageStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DiskPassageStore::new("wiki", dir.path().join("passages")));
        store
            .put_topic(
                "Color",
                COLOR_PASSAGES
                    .iter()
                    .map(|text| Passage::new("Color", *text))
                    .collect(),
            )
            .unwrap();
        Self { dir, store }
    }

    pub fn config(&self) -> Config {
        Config {
            cache_dir: self.dir.path().join("cache"),
            passage_dir: self.dir.path().join("passages"),
            ..Config::default()
        }
    }

    pub fn scorer(&self, model: &MockLanguageModel, config: Config, cache: Arc<EngineCache>) -> FactScorer {
        FactScorer::builder()
            .config(config)
            .with_model(Arc::new(model.clone()))
            .with_corpus(Arc::clone(&self.store) as Arc<dyn PassageStore>)
            .with_cache(cache)
            .build()
            .unwrap()
    }
}
