//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `ATOMFACT_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DECOMPOSE_MAX_TOKENS, DEFAULT_DECOMPOSE_MODEL, DEFAULT_FLUSH_INTERVAL_SECS,
    DEFAULT_GAMMA, DEFAULT_MAX_CLAIMS, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_RRF_K, DEFAULT_TOP_K,
    DEFAULT_VERIFY_MAX_TOKENS, DEFAULT_VERIFY_MODEL,
};
use crate::index::IndexKind;

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `ATOMFACT_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Passages retrieved per claim. Default: `5`.
    pub top_k: usize,

    /// Length-penalty threshold. Default: `10`.
    pub gamma: usize,

    /// Max simultaneously outstanding model calls. Default: `8`.
    pub max_concurrency: usize,

    /// Per model call timeout. Default: `60s`.
    pub request_timeout: Duration,

    /// Retries after the first failed model or store call. Default: `3`.
    pub max_retries: u32,

    /// Initial retry backoff. Default: `500ms`.
    pub retry_backoff: Duration,

    /// Directory for the retrieval, index and model caches. Default: `./.cache/atomfact`.
    pub cache_dir: PathBuf,

    /// `false` disables all caching. Default: `true`.
    pub cache_enabled: bool,

    /// Background cache flush interval. Default: `30s`.
    pub flush_interval: Duration,

    /// Root of the on-disk passage store. Default: `./.data/passages`.
    pub passage_dir: PathBuf,

    pub decompose_model: String,
    pub verify_model: String,
    pub decompose_max_tokens: u32,
    pub verify_max_tokens: u32,

    /// Rank-fusion smoothing constant. Default: `100`.
    pub rrf_k: f64,

    /// Claims kept per input text. Default: `50`.
    pub max_claims: usize,

    /// Retriever families, fused when more than one. Default: `[bm25]`.
    pub retrievers: Vec<IndexKind>,

    /// Wall-clock bound for one `score` call. Default: none.
    pub evaluation_timeout: Option<Duration>,
}

/// Default cache directory used when `ATOMFACT_CACHE_DIR` is not set.
pub const DEFAULT_CACHE_DIR: &str = "./.cache/atomfact";

/// Default passage directory used when `ATOMFACT_PASSAGE_DIR` is not set.
pub const DEFAULT_PASSAGE_DIR: &str = "./.data/passages";

impl Default for Config {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            gamma: DEFAULT_GAMMA,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_enabled: true,
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            passage_dir: PathBuf::from(DEFAULT_PASSAGE_DIR),
            decompose_model: DEFAULT_DECOMPOSE_MODEL.to_string(),
            verify_model: DEFAULT_VERIFY_MODEL.to_string(),
            decompose_max_tokens: DEFAULT_DECOMPOSE_MAX_TOKENS,
            verify_max_tokens: DEFAULT_VERIFY_MAX_TOKENS,
            rrf_k: DEFAULT_RRF_K,
            max_claims: DEFAULT_MAX_CLAIMS,
            retrievers: vec![IndexKind::Bm25],
            evaluation_timeout: None,
        }
    }
}

impl Config {
    const ENV_TOP_K: &'static str = "ATOMFACT_TOP_K";
    const ENV_GAMMA: &'static str = "ATOMFACT_GAMMA";
    const ENV_MAX_CONCURRENCY: &'static str = "ATOMFACT_MAX_CONCURRENCY";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "ATOMFACT_REQUEST_TIMEOUT_SECS";
    const ENV_MAX_RETRIES: &'static str = "ATOMFACT_MAX_RETRIES";
    const ENV_RETRY_BACKOFF_MS: &'static str = "ATOMFACT_RETRY_BACKOFF_MS";
    const ENV_CACHE_DIR: &'static str = "ATOMFACT_CACHE_DIR";
    const ENV_CACHE_ENABLED: &'static str = "ATOMFACT_CACHE_ENABLED";
    const ENV_FLUSH_INTERVAL_SECS: &'static str = "ATOMFACT_FLUSH_INTERVAL_SECS";
    const ENV_PASSAGE_DIR: &'static str = "ATOMFACT_PASSAGE_DIR";
    const ENV_DECOMPOSE_MODEL: &'static str = "ATOMFACT_DECOMPOSE_MODEL";
    const ENV_VERIFY_MODEL: &'static str = "ATOMFACT_VERIFY_MODEL";
    const ENV_DECOMPOSE_MAX_TOKENS: &'static str = "ATOMFACT_DECOMPOSE_MAX_TOKENS";
    const ENV_VERIFY_MAX_TOKENS: &'static str = "ATOMFACT_VERIFY_MAX_TOKENS";
    const ENV_RRF_K: &'static str = "ATOMFACT_RRF_K";
    const ENV_MAX_CLAIMS: &'static str = "ATOMFACT_MAX_CLAIMS";
    const ENV_RETRIEVERS: &'static str = "ATOMFACT_RETRIEVERS";
    const ENV_EVALUATION_TIMEOUT_SECS: &'static str = "ATOMFACT_EVALUATION_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// A variable that is set but unparseable is an error, not a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let top_k = Self::parse_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let gamma = Self::parse_from_env(Self::ENV_GAMMA, defaults.gamma)?;
        let max_concurrency =
            Self::parse_from_env(Self::ENV_MAX_CONCURRENCY, defaults.max_concurrency)?;
        let request_timeout =
            Self::parse_secs_from_env(Self::ENV_REQUEST_TIMEOUT_SECS, defaults.request_timeout)?;
        let max_retries = Self::parse_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries)?;
        let retry_backoff = Duration::from_millis(Self::parse_from_env(
            Self::ENV_RETRY_BACKOFF_MS,
            defaults.retry_backoff.as_millis() as u64,
        )?);
        let cache_dir = Self::parse_path_from_env(Self::ENV_CACHE_DIR, defaults.cache_dir);
        let cache_enabled = Self::parse_bool_from_env(Self::ENV_CACHE_ENABLED, defaults.cache_enabled)?;
        let flush_interval =
            Self::parse_secs_from_env(Self::ENV_FLUSH_INTERVAL_SECS, defaults.flush_interval)?;
        let passage_dir = Self::parse_path_from_env(Self::ENV_PASSAGE_DIR, defaults.passage_dir);
        let decompose_model =
            Self::parse_string_from_env(Self::ENV_DECOMPOSE_MODEL, defaults.decompose_model);
        let verify_model = Self::parse_string_from_env(Self::ENV_VERIFY_MODEL, defaults.verify_model);
        let decompose_max_tokens =
            Self::parse_from_env(Self::ENV_DECOMPOSE_MAX_TOKENS, defaults.decompose_max_tokens)?;
        let verify_max_tokens =
            Self::parse_from_env(Self::ENV_VERIFY_MAX_TOKENS, defaults.verify_max_tokens)?;
        let rrf_k = Self::parse_from_env(Self::ENV_RRF_K, defaults.rrf_k)?;
        let max_claims = Self::parse_from_env(Self::ENV_MAX_CLAIMS, defaults.max_claims)?;
        let retrievers = Self::parse_retrievers_from_env(defaults.retrievers)?;
        let evaluation_timeout = Self::parse_optional_secs_from_env(Self::ENV_EVALUATION_TIMEOUT_SECS)?;

        Ok(Self {
            top_k,
            gamma,
            max_concurrency,
            request_timeout,
            max_retries,
            retry_backoff,
            cache_dir,
            cache_enabled,
            flush_interval,
            passage_dir,
            decompose_model,
            verify_model,
            decompose_max_tokens,
            verify_max_tokens,
            rrf_k,
            max_claims,
            retrievers,
            evaluation_timeout,
        })
    }

    /// Validates numeric ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("top_k", self.top_k),
            ("gamma", self.gamma),
            ("max_concurrency", self.max_concurrency),
            ("max_claims", self.max_claims),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::MustBePositive { name });
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                name: "request_timeout",
            });
        }

        if self.evaluation_timeout.is_some_and(|limit| limit.is_zero()) {
            return Err(ConfigError::MustBePositive {
                name: "evaluation_timeout",
            });
        }

        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "rrf_k",
                value: self.rrf_k.to_string(),
                reason: "must be a finite, non-negative number".to_string(),
            });
        }

        if self.retrievers.is_empty() {
            return Err(ConfigError::NoRetrievers);
        }

        for model in [&self.decompose_model, &self.verify_model] {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModel);
            }
        }

        for path in [&self.cache_dir, &self.passage_dir] {
            if path.exists() && !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_secs_from_env(var_name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Self::parse_from_env(var_name, default.as_secs()).map(Duration::from_secs)
    }

    fn parse_optional_secs_from_env(var_name: &'static str) -> Result<Option<Duration>, ConfigError> {
        match env::var(var_name) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(_) => Self::parse_secs_from_env(var_name, Duration::ZERO).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_retrievers_from_env(default: Vec<IndexKind>) -> Result<Vec<IndexKind>, ConfigError> {
        let Ok(value) = env::var(Self::ENV_RETRIEVERS) else {
            return Ok(default);
        };

        let mut kinds = Vec::new();
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let kind: IndexKind = part.parse().map_err(|reason| ConfigError::InvalidValue {
                name: Self::ENV_RETRIEVERS,
                value: value.clone(),
                reason,
            })?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}
