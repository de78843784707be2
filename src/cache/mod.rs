//! Disk-persisted memoization for retrieval results, built indices and model outputs.
//!
//! Caches are injected into collaborators (no global state). I/O failures are
//! logged and degrade to cache miss / skipped write.

pub mod config;
pub mod engine;
pub mod error;
pub mod flush;
pub mod kv;

#[cfg(test)]
mod tests;

pub use config::CacheConfig;
pub use engine::{
    EngineCache, EngineCacheStats, INDEX_CACHE_NAME, MODEL_CACHE_NAME, RETRIEVAL_CACHE_NAME,
};
pub use error::{CacheError, CacheResult};
pub use flush::CacheFlusher;
pub use kv::{CacheMode, CacheStats, KvCache};
