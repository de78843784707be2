//! Content-addressed key-value cache with JSON snapshot persistence.
//!
//! Entries live in an unbounded [`moka`] cache keyed by [`CacheKey`]. Writes only
//! mark the cache dirty; [`KvCache::flush`] snapshots everything to
//! `<dir>/<name>.json` via temp-file + rename. Entries never expire.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use moka::sync::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{CacheError, CacheResult};
use crate::hashing::CacheKey;

const SNAPSHOT_EXTENSION: &str = "json";

const TEMP_EXTENSION: &str = "json.tmp";

/// Storage behavior of a [`KvCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// In memory, snapshotted to a file inside this directory.
    Persistent(PathBuf),
    /// In memory only.
    Memory,
    /// Every lookup misses and every write is dropped.
    Disabled,
}

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
    pub dirty: bool,
}

pub struct KvCache<V> {
    name: String,
    mode: CacheMode,
    entries: Cache<CacheKey, V>,
    dirty: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    flush_lock: Mutex<()>,
}

impl<V> std::fmt::Debug for KvCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvCache")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl<V> KvCache<V>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Opens a cache. A persistent cache loads its snapshot if present; a missing
    /// or unreadable snapshot starts empty.
    pub fn open(name: impl Into<String>, mode: CacheMode) -> Self {
        let cache = Self {
            name: name.into(),
            mode,
            entries: Cache::builder().build(),
            dirty: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        };

        if let CacheMode::Persistent(dir) = &cache.mode {
            let path = cache.snapshot_path(dir);
            match cache.load_snapshot(&path) {
                Ok(0) => {}
                Ok(loaded) => {
                    debug!(cache = %cache.name, loaded, path = %path.display(), "Loaded cache snapshot");
                }
                Err(e) => {
                    warn!(cache = %cache.name, error = %e, "Ignoring unreadable cache snapshot");
                }
            }
        }

        cache
    }

    pub fn memory(name: impl Into<String>) -> Self {
        Self::open(name, CacheMode::Memory)
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self::open(name, CacheMode::Disabled)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &CacheMode {
        &self.mode
    }

    #[inline]
    fn is_disabled(&self) -> bool {
        matches!(self.mode, CacheMode::Disabled)
    }

    fn snapshot_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.name, SNAPSHOT_EXTENSION))
    }

    fn temp_snapshot_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.name, TEMP_EXTENSION))
    }

    fn load_snapshot(&self, path: &Path) -> CacheResult<usize> {
        if !path.exists() {
            return Ok(0);
        }

        let file = File::open(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: BTreeMap<String, V> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CacheError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut loaded = 0;
        for (hex, value) in snapshot {
            if let Some(key) = CacheKey::from_hex(&hex) {
                self.entries.insert(key, value);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Returns a cached value, counting the hit or miss.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        if self.is_disabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let value = self.entries.get(key);
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Stores a value and marks the cache dirty.
    pub fn insert(&self, key: CacheKey, value: V) {
        if self.is_disabled() {
            return;
        }
        self.entries.insert(key, value);
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns the cached value or computes it. Concurrent callers for the same
    /// key wait for a single initialization.
    pub fn get_or_try_insert_with<E, F>(&self, key: CacheKey, init: F) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Result<V, E>,
        E: Send + Sync + 'static,
    {
        if self.is_disabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return init().map_err(Arc::new);
        }

        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = self.entries.try_get_with(key, init)?;
        self.dirty.store(true, Ordering::Release);
        Ok(value)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        !self.is_disabled() && self.entries.contains_key(key)
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
            dirty: self.is_dirty(),
        }
    }

    /// Writes a snapshot if the cache is persistent and dirty. Returns the number
    /// of entries written (0 when there was nothing to do).
    pub fn flush(&self) -> CacheResult<usize> {
        let CacheMode::Persistent(dir) = &self.mode else {
            return Ok(0);
        };

        let _guard = self.flush_lock.lock();

        // AcqRel: clear the flag before snapshotting so writes racing with the
        // snapshot re-mark the cache dirty for the next flush.
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(0);
        }

        match self.write_snapshot(dir) {
            Ok(written) => Ok(written),
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    fn write_snapshot(&self, dir: &Path) -> CacheResult<usize> {
        fs::create_dir_all(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let snapshot: BTreeMap<String, V> = self
            .entries
            .iter()
            .map(|(key, value)| (key.to_hex(), value))
            .collect();

        let temp_path = self.temp_snapshot_path(dir);
        let final_path = self.snapshot_path(dir);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Io { path, source }
        };

        {
            let file = File::create(&temp_path).map_err(io_err(&temp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &snapshot).map_err(|e| CacheError::Encode {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;
            writer.flush().map_err(io_err(&temp_path))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(io_err(&temp_path))?;
        }

        fs::rename(&temp_path, &final_path).map_err(io_err(&final_path))?;

        Ok(snapshot.len())
    }
}
