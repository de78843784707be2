use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::constants::DEFAULT_FLUSH_INTERVAL_SECS;

/// Where and how the engine caches persist.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory for the three cache files; `None` keeps caches in memory only.
    pub dir: Option<PathBuf>,
    /// `false` turns every cache into a no-op.
    pub enabled: bool,
    /// Interval for the background flusher.
    pub flush_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            enabled: true,
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
        }
    }
}

impl CacheConfig {
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

impl From<&Config> for CacheConfig {
    fn from(config: &Config) -> Self {
        Self {
            dir: Some(config.cache_dir.clone()),
            enabled: config.cache_enabled,
            flush_interval: config.flush_interval,
        }
    }
}
