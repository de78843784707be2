use super::*;
use crate::hashing::{model_call_key, retrieval_key};
use crate::retrieval::Evidence;
use crate::storage::Passage;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

fn key(n: u32) -> crate::hashing::CacheKey {
    model_call_key(&format!("prompt-{n}"), "model", 16)
}

#[test]
fn test_memory_cache_get_insert_and_stats() {
    let cache: KvCache<String> = KvCache::memory("model");

    assert!(cache.get(&key(1)).is_none());
    cache.insert(key(1), "True".to_string());

    assert_eq!(cache.get(&key(1)).as_deref(), Some("True"));
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
    assert!(stats.dirty);
}

#[test]
fn test_disabled_cache_never_stores() {
    let cache: KvCache<String> = KvCache::disabled("model");

    cache.insert(key(1), "value".to_string());
    assert!(cache.get(&key(1)).is_none());
    assert!(!cache.contains(&key(1)));
    assert!(!cache.is_dirty());
    assert_eq!(cache.flush().unwrap(), 0);
}

#[test]
fn test_memory_cache_flush_is_noop() {
    let cache: KvCache<String> = KvCache::memory("model");
    cache.insert(key(1), "value".to_string());

    assert_eq!(cache.flush().unwrap(), 0);
}

#[test]
fn test_persistent_cache_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let mode = CacheMode::Persistent(dir.path().to_path_buf());

    {
        let cache: KvCache<String> = KvCache::open("model", mode.clone());
        cache.insert(key(1), "first".to_string());
        cache.insert(key(2), "second".to_string());
        assert_eq!(cache.flush().unwrap(), 2);
        assert!(!cache.is_dirty());
    }

    let reopened: KvCache<String> = KvCache::open("model", mode);
    assert_eq!(reopened.get(&key(1)).as_deref(), Some("first"));
    assert_eq!(reopened.get(&key(2)).as_deref(), Some("second"));
    assert!(!reopened.is_dirty());
}

#[test]
fn test_flush_skips_when_clean() {
    let dir = TempDir::new().unwrap();
    let cache: KvCache<String> =
        KvCache::open("model", CacheMode::Persistent(dir.path().to_path_buf()));

    assert_eq!(cache.flush().unwrap(), 0);
    assert!(!dir.path().join("model.json").exists());

    cache.insert(key(1), "v".to_string());
    assert_eq!(cache.flush().unwrap(), 1);
    assert_eq!(cache.flush().unwrap(), 0);
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("model.json"), b"{not json").unwrap();

    let cache: KvCache<String> =
        KvCache::open("model", CacheMode::Persistent(dir.path().to_path_buf()));
    assert!(cache.is_empty());
    assert!(cache.get(&key(1)).is_none());
}

#[test]
fn test_flush_failure_keeps_dirty() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    let cache: KvCache<String> = KvCache::open("model", CacheMode::Persistent(blocker));
    cache.insert(key(1), "v".to_string());

    assert!(cache.flush().is_err());
    assert!(cache.is_dirty());
    assert_eq!(cache.get(&key(1)).as_deref(), Some("v"));
}

#[test]
fn test_get_or_try_insert_with_initializes_once() {
    let cache: KvCache<Arc<String>> = KvCache::memory("index");
    let builds = AtomicUsize::new(0);

    for _ in 0..3 {
        let value = cache
            .get_or_try_insert_with(key(7), || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok::<_, std::io::Error>(Arc::new("built".to_string()))
            })
            .unwrap();
        assert_eq!(value.as_str(), "built");
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_or_try_insert_with_error_is_not_cached() {
    let cache: KvCache<String> = KvCache::memory("index");

    let err = cache.get_or_try_insert_with(key(1), || {
        Err::<String, _>(std::io::Error::other("backend down"))
    });
    assert!(err.is_err());
    assert!(!cache.contains(&key(1)));
}

#[test]
fn test_engine_cache_modes() {
    let dir = TempDir::new().unwrap();

    let persistent = EngineCache::new(&CacheConfig::persistent(dir.path()));
    assert!(matches!(
        persistent.model().mode(),
        CacheMode::Persistent(_)
    ));

    let memory = EngineCache::new(&CacheConfig::default());
    assert_eq!(memory.retrieval().mode(), &CacheMode::Memory);

    let disabled = EngineCache::new(&CacheConfig {
        dir: Some(dir.path().to_path_buf()),
        ..CacheConfig::disabled()
    });
    assert_eq!(disabled.index().mode(), &CacheMode::Disabled);
}

#[test]
fn test_engine_cache_flushes_all_three() {
    let dir = TempDir::new().unwrap();
    let cache = EngineCache::new(&CacheConfig::persistent(dir.path()));

    cache.model().insert(key(1), "True".to_string());
    cache.retrieval().insert(
        retrieval_key("bm25", "Color", "Color sky", 5),
        Evidence::new(vec![Passage::new("Color", "sky")], vec![1.0]),
    );

    assert_eq!(cache.flush(), 2);
    assert!(dir.path().join("model.json").exists());
    assert!(dir.path().join("retrieval.json").exists());
    assert!(!dir.path().join("index.json").exists());

    let reopened = EngineCache::new(&CacheConfig::persistent(dir.path()));
    let evidence = reopened
        .retrieval()
        .get(&retrieval_key("bm25", "Color", "Color sky", 5))
        .unwrap();
    assert_eq!(evidence.passages[0].text, "sky");
}

#[tokio::test]
async fn test_flusher_shutdown_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(EngineCache::new(&CacheConfig::persistent(dir.path())));
    cache.model().insert(key(1), "v".to_string());

    let flusher = CacheFlusher::new(Arc::clone(&cache), Duration::from_secs(3600));
    assert_eq!(flusher.shutdown().await, 1);
    assert!(flusher.is_shutdown_initiated());

    cache.model().insert(key(2), "w".to_string());
    assert_eq!(flusher.shutdown().await, 0);
}

#[tokio::test]
async fn test_flusher_periodic_flush() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(EngineCache::new(&CacheConfig::persistent(dir.path())));
    let flusher = CacheFlusher::new(Arc::clone(&cache), Duration::from_millis(20));
    let handle = flusher.start();

    cache.model().insert(key(1), "v".to_string());

    let path = dir.path().join("model.json");
    for _ in 0..100 {
        if path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(path.exists());

    flusher.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("flusher should stop after shutdown")
        .unwrap();
}
