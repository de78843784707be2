//! In-memory passage store for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::PassageStore;
use super::error::{PassageStoreError, PassageStoreResult};
use super::model::Passage;

/// Map-backed [`PassageStore`] with failure injection.
#[derive(Default)]
pub struct MemoryPassageStore {
    name: String,
    topics: RwLock<HashMap<String, Arc<[Passage]>>>,
    failures_remaining: AtomicU32,
    lookups: AtomicUsize,
}

impl MemoryPassageStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style insert of one topic.
    pub fn with_topic(self, topic: &str, passages: Vec<Passage>) -> Self {
        self.insert(topic, passages);
        self
    }

    pub fn insert(&self, topic: &str, passages: Vec<Passage>) {
        self.topics
            .write()
            .insert(topic.to_string(), Arc::from(passages));
    }

    /// The next `n` lookups fail with [`PassageStoreError::Unavailable`].
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Number of `get_passages` calls observed (including failed ones).
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PassageStore for MemoryPassageStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_passages(&self, topic: &str) -> PassageStoreResult<Option<Arc<[Passage]>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(PassageStoreError::Unavailable {
                reason: "injected failure".to_string(),
            });
        }

        Ok(self
            .topics
            .read()
            .get(topic)
            .filter(|p| !p.is_empty())
            .cloned())
    }
}
