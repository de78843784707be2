use super::*;
use crate::index::VectorMetric;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const ALL_VARS: &[&str] = &[
    "ATOMFACT_TOP_K",
    "ATOMFACT_GAMMA",
    "ATOMFACT_MAX_CONCURRENCY",
    "ATOMFACT_REQUEST_TIMEOUT_SECS",
    "ATOMFACT_MAX_RETRIES",
    "ATOMFACT_RETRY_BACKOFF_MS",
    "ATOMFACT_CACHE_DIR",
    "ATOMFACT_CACHE_ENABLED",
    "ATOMFACT_FLUSH_INTERVAL_SECS",
    "ATOMFACT_PASSAGE_DIR",
    "ATOMFACT_DECOMPOSE_MODEL",
    "ATOMFACT_VERIFY_MODEL",
    "ATOMFACT_DECOMPOSE_MAX_TOKENS",
    "ATOMFACT_VERIFY_MAX_TOKENS",
    "ATOMFACT_RRF_K",
    "ATOMFACT_MAX_CLAIMS",
    "ATOMFACT_RETRIEVERS",
    "ATOMFACT_EVALUATION_TIMEOUT_SECS",
];

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_atomfact_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for var in ALL_VARS {
        unsafe { env::remove_var(var) };
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.top_k, 5);
    assert_eq!(config.gamma, 10);
    assert_eq!(config.max_concurrency, 8);
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.cache_dir, PathBuf::from("./.cache/atomfact"));
    assert!(config.cache_enabled);
    assert_eq!(config.decompose_model, "gpt-4o-mini");
    assert_eq!(config.rrf_k, 100.0);
    assert_eq!(config.max_claims, 50);
    assert_eq!(config.retrievers, vec![IndexKind::Bm25]);
    assert!(config.evaluation_timeout.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_atomfact_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.top_k, 5);
    assert_eq!(config.gamma, 10);
    assert_eq!(config.passage_dir, PathBuf::from("./.data/passages"));
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_atomfact_env();

    let config = with_env_vars(
        &[
            ("ATOMFACT_TOP_K", "3"),
            ("ATOMFACT_GAMMA", "7"),
            ("ATOMFACT_REQUEST_TIMEOUT_SECS", "15"),
            ("ATOMFACT_RETRY_BACKOFF_MS", "20"),
            ("ATOMFACT_CACHE_DIR", "/tmp/atomfact-cache"),
            ("ATOMFACT_CACHE_ENABLED", "false"),
            ("ATOMFACT_VERIFY_MODEL", "gpt-4o"),
            ("ATOMFACT_RRF_K", "60"),
            ("ATOMFACT_RETRIEVERS", "bm25, vector-l2"),
            ("ATOMFACT_EVALUATION_TIMEOUT_SECS", "120"),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.top_k, 3);
    assert_eq!(config.gamma, 7);
    assert_eq!(config.request_timeout, Duration::from_secs(15));
    assert_eq!(config.retry_backoff, Duration::from_millis(20));
    assert_eq!(config.cache_dir, PathBuf::from("/tmp/atomfact-cache"));
    assert!(!config.cache_enabled);
    assert_eq!(config.verify_model, "gpt-4o");
    assert_eq!(config.decompose_model, "gpt-4o-mini");
    assert_eq!(config.rrf_k, 60.0);
    assert_eq!(
        config.retrievers,
        vec![IndexKind::Bm25, IndexKind::Vector(VectorMetric::L2)]
    );
    assert_eq!(config.evaluation_timeout, Some(Duration::from_secs(120)));
}

#[test]
#[serial]
fn test_from_env_rejects_garbage_number() {
    clear_atomfact_env();

    let result = with_env_vars(&[("ATOMFACT_TOP_K", "five")], Config::from_env);

    match result {
        Err(ConfigError::InvalidValue { name, value, .. }) => {
            assert_eq!(name, "ATOMFACT_TOP_K");
            assert_eq!(value, "five");
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_retriever() {
    clear_atomfact_env();

    let result = with_env_vars(&[("ATOMFACT_RETRIEVERS", "bm25,colbert")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_bool() {
    clear_atomfact_env();

    let result = with_env_vars(&[("ATOMFACT_CACHE_ENABLED", "maybe")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_retrievers_deduplicated() {
    clear_atomfact_env();

    let config = with_env_vars(&[("ATOMFACT_RETRIEVERS", "bm25,lexical,bm25")], Config::from_env)
        .unwrap();
    assert_eq!(config.retrievers, vec![IndexKind::Bm25]);
}

#[test]
fn test_validate_rejects_zero_top_k() {
    let config = Config {
        top_k: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MustBePositive { name: "top_k" })
    ));
}

#[test]
fn test_validate_rejects_negative_rrf_k() {
    let config = Config {
        rrf_k: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { name: "rrf_k", .. })
    ));
}

#[test]
#[serial]
fn test_validate_rejects_zero_evaluation_timeout() {
    clear_atomfact_env();
    let config = with_env_vars(&[("ATOMFACT_EVALUATION_TIMEOUT_SECS", "0")], || {
        Config::from_env().unwrap()
    });

    assert_eq!(config.evaluation_timeout, Some(Duration::ZERO));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MustBePositive {
            name: "evaluation_timeout"
        })
    ));
}

#[test]
fn test_validate_rejects_empty_retrievers() {
    let config = Config {
        retrievers: Vec::new(),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NoRetrievers)));
}

#[test]
fn test_validate_cache_dir_is_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = Config {
        cache_dir: file.path().to_path_buf(),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}
