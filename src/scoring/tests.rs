use super::*;
use crate::cache::EngineCache;
use crate::config::{Config, ConfigError};
use crate::decompose::{AtomicClaim, DECOMPOSE_INSTRUCTION};
use crate::llm::{LlmError, MockLanguageModel};
use crate::storage::{MemoryPassageStore, Passage};
use crate::verify::VerificationResult;

use std::sync::Arc;
use std::time::Duration;

fn target_sentence(prompt: &str) -> &str {
    prompt
        .trim_end()
        .lines()
        .last()
        .and_then(|line| line.strip_prefix(DECOMPOSE_INSTRUCTION))
        .map(str::trim)
        .unwrap_or_default()
}

fn verification_claim(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Input: ")?.strip_suffix(" True or False?"))
}

/// Each sentence decomposes to itself; claims containing a `supported` needle verify as True.
fn fact_model(supported: &'static [&'static str]) -> MockLanguageModel {
    MockLanguageModel::new(move |prompt, _| match verification_claim(prompt) {
        Some(claim) if supported.iter().any(|needle| claim.contains(needle)) => Ok("True".to_string()),
        Some(_) => Ok("False".to_string()),
        None => Ok(format!("- {}", target_sentence(prompt))),
    })
}

fn color_store() -> MemoryPassageStore {
    MemoryPassageStore::new("wiki").with_topic(
        "Color",
        vec![
            Passage::new("Color", "The sky appears blue because of Rayleigh scattering."),
            Passage::new("Color", "Grass is green because of chlorophyll."),
        ],
    )
}

fn scorer_with(model: &MockLanguageModel, config: Config) -> FactScorer {
    FactScorer::builder()
        .config(config)
        .with_model(Arc::new(model.clone()))
        .with_corpus(Arc::new(color_store()))
        .with_cache(Arc::new(EngineCache::in_memory()))
        .build()
        .unwrap()
}

fn scorer(model: &MockLanguageModel) -> FactScorer {
    scorer_with(model, Config::default())
}

fn detail(text: &str, is_supported: bool) -> VerificationResult {
    VerificationResult {
        claim: AtomicClaim {
            source_sentence: text.to_string(),
            claim_text: text.to_string(),
            claim_id: 0,
        },
        is_supported,
        raw_model_output: String::new(),
    }
}

// --- length penalty ---

#[test]
fn test_length_penalty_values() {
    assert_eq!(length_penalty(10, 10), 1.0);
    assert_eq!(length_penalty(25, 10), 1.0);
    assert!((length_penalty(1, 10) - (-9.0f64).exp()).abs() < 1e-12);
    assert!((length_penalty(5, 10) - (-1.0f64).exp()).abs() < 1e-12);
    assert_eq!(length_penalty(0, 10), 0.0);
    assert_eq!(length_penalty(3, 0), 1.0);
}

#[test]
fn test_length_penalty_is_monotonic() {
    let values: Vec<f64> = (1..=12).map(|n| length_penalty(n, 10)).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
}

// --- aggregation ---

#[test]
fn test_from_details_applies_penalty() {
    let details = vec![
        detail("a is b", true),
        detail("c is d", true),
        detail("e is f", false),
        detail("g is h", true),
    ];

    let score = FactualityScore::from_details(details, 10);

    assert_eq!(score.num_facts, 4);
    assert_eq!(score.supported_facts, 3);
    assert_eq!(score.raw_score, 0.75);
    assert!((score.score - 0.75 * (1.0f64 - 2.5).exp()).abs() < 1e-12);
    assert_eq!(score.issues, vec!["Unsupported claim: e is f"]);
}

#[test]
fn test_issues_are_capped_and_truncated() {
    let long = "x".repeat(300);
    let details = vec![
        detail(&long, false),
        detail("two", false),
        detail("three", false),
        detail("four", false),
    ];

    let score = FactualityScore::from_details(details, 1);

    assert_eq!(score.issues.len(), 3);
    assert_eq!(
        score.issues[0],
        format!("{}{}...", UNSUPPORTED_ISSUE_PREFIX, "x".repeat(120))
    );
    assert_eq!(score.issues[2], "Unsupported claim: three");
    assert_eq!(score.score, 0.0);
}

#[test]
fn test_batch_score_means() {
    let batch = BatchScore::from_scores(vec![
        FactualityScore::from_details(vec![detail("a", true), detail("b", false)], 1),
        FactualityScore::no_claims(),
    ]);

    assert_eq!(batch.mean_score, 0.5);
    assert_eq!(batch.mean_raw_score, 0.25);
    assert_eq!(batch.respond_ratio, 0.5);
    assert_eq!(batch.mean_num_facts, 1.0);

    let empty = BatchScore::from_scores(Vec::new());
    assert_eq!(empty.mean_score, 0.0);
    assert!(empty.scores.is_empty());
}

// --- scorer ---

#[tokio::test]
async fn test_empty_text_makes_no_calls() {
    let model = fact_model(&[]);
    let scorer = scorer(&model);

    for text in ["", "   \n"] {
        let score = scorer.score(text, "Color").await;
        assert_eq!(score.score, 0.0);
        assert_eq!(score.num_facts, 0);
        assert_eq!(score.issues, vec![ISSUE_EMPTY_TEXT]);
    }
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_no_claims_is_neutral() {
    let model = MockLanguageModel::constant("No verifiable claim.");
    let scorer = scorer(&model);

    let score = scorer.score("I feel sad today.", "Color").await;

    assert_eq!(score.score, 0.5);
    assert_eq!(score.num_facts, 0);
    assert!(score.details.is_empty());
    assert_eq!(score.issues, vec![ISSUE_NO_FACTS]);
}

#[tokio::test]
async fn test_unknown_topic_marks_every_claim_unsupported() {
    let model = fact_model(&["sky"]);
    let scorer = scorer(&model);

    let score = scorer.score("The sky is blue.", "NonexistentTopic42").await;

    assert_eq!(score.score, 0.0);
    assert_eq!(score.num_facts, 1);
    assert_eq!(score.supported_facts, 0);
    assert_eq!(score.details.len(), 1);
    assert!(!score.details[0].is_supported);
    assert_eq!(score.issues, vec![ISSUE_NO_PASSAGES]);
    // Decomposition only; no verification call for an unknown topic.
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_single_supported_claim_is_penalized() {
    let model = fact_model(&["sky"]);
    let scorer = scorer(&model);

    let score = scorer.score("The sky is blue.", "Color").await;

    assert_eq!(score.num_facts, 1);
    assert_eq!(score.supported_facts, 1);
    assert_eq!(score.raw_score, 1.0);
    assert!((score.score - (-9.0f64).exp()).abs() < 1e-9);
    assert!(score.issues.is_empty());
    assert_eq!(score.details[0].raw_model_output, "True");
}

#[tokio::test]
async fn test_details_follow_claim_order() {
    let model = fact_model(&["Grass"]).with_latency(Duration::from_millis(2));
    let config = Config {
        gamma: 1,
        ..Config::default()
    };
    let scorer = scorer_with(&model, config);

    let score = scorer
        .score("The sky is green. Grass is green. Snow is purple.", "Color")
        .await;

    let claims: Vec<&str> = score
        .details
        .iter()
        .map(|d| d.claim.claim_text.as_str())
        .collect();
    assert_eq!(claims, vec!["The sky is green.", "Grass is green.", "Snow is purple."]);
    assert_eq!(score.num_facts, score.details.len());
    assert_eq!(score.supported_facts, 1);
    assert!((score.score - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(
        score.issues,
        vec![
            "Unsupported claim: The sky is green.",
            "Unsupported claim: Snow is purple."
        ]
    );
}

#[tokio::test]
async fn test_rescoring_hits_model_cache() {
    let model = fact_model(&["sky"]);
    let scorer = scorer(&model);

    let first = scorer.score("The sky is blue.", "Color").await;
    let calls = model.call_count();
    let second = scorer.score("The sky is blue.", "Color").await;

    assert_eq!(first, second);
    assert_eq!(model.call_count(), calls);
}

#[tokio::test]
async fn test_verification_failure_degrades_claim() {
    let model = MockLanguageModel::new(|prompt, _| {
        if prompt.contains("True or False?") {
            Err(LlmError::Provider("judge down".into()))
        } else {
            Ok(format!("- {}", target_sentence(prompt)))
        }
    });
    let config = Config {
        max_retries: 0,
        ..Config::default()
    };
    let scorer = scorer_with(&model, config);

    let score = scorer.score("The sky is blue.", "Color").await;

    assert_eq!(score.num_facts, 1);
    assert_eq!(score.supported_facts, 0);
    assert_eq!(score.score, 0.0);
}

#[tokio::test]
async fn test_model_concurrency_is_bounded() {
    let model = fact_model(&["is"]).with_latency(Duration::from_millis(10));
    let config = Config {
        max_concurrency: 2,
        ..Config::default()
    };
    let scorer = scorer_with(&model, config);

    let score = scorer
        .score(
            "Alpha is one. Beta is two. Gamma is three. Delta is four. Epsilon is five.",
            "Color",
        )
        .await;

    assert_eq!(score.num_facts, 5);
    assert!(model.max_in_flight() <= 2);
}

#[tokio::test]
async fn test_evaluation_timeout() {
    let model = fact_model(&["sky"]).with_latency(Duration::from_millis(200));
    let config = Config {
        evaluation_timeout: Some(Duration::from_millis(20)),
        ..Config::default()
    };
    let scorer = scorer_with(&model, config);

    let score = scorer.score("The sky is blue.", "Color").await;

    assert_eq!(score.score, 0.0);
    assert_eq!(score.issues, vec![ISSUE_TIMED_OUT]);
}

#[tokio::test]
async fn test_score_batch_keeps_input_order() {
    let model = fact_model(&["sky"]);
    let scorer = scorer(&model);

    let batch = scorer
        .score_batch(&[("", "Color"), ("The sky is blue.", "Color")])
        .await;

    assert_eq!(batch.scores.len(), 2);
    assert_eq!(batch.scores[0].issues, vec![ISSUE_EMPTY_TEXT]);
    assert_eq!(batch.scores[1].supported_facts, 1);
    assert_eq!(batch.respond_ratio, 0.5);
}

#[test]
fn test_build_requires_model() {
    let err = FactScorer::builder()
        .with_corpus(Arc::new(color_store()))
        .with_cache(Arc::new(EngineCache::in_memory()))
        .build()
        .unwrap_err();

    assert!(matches!(err, ScoringError::MissingModel));
}

#[test]
fn test_build_rejects_invalid_config() {
    let err = FactScorer::builder()
        .config(Config {
            top_k: 0,
            ..Config::default()
        })
        .with_model(Arc::new(MockLanguageModel::constant("True")))
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        ScoringError::Config(ConfigError::MustBePositive { name: "top_k" })
    ));
}
