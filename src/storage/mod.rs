//! Passage store: topic → ordered, immutable passages.
//!
//! The store is populated out of band and is read-only during evaluation. A
//! missing topic is reported as `Ok(None)`; only I/O and decoding failures are
//! errors.

pub mod chunk;
pub mod disk;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod memory;
pub mod mmap;
mod model;


use std::sync::Arc;

pub use chunk::chunk_passages;
pub use disk::DiskPassageStore;
pub use error::{PassageStoreError, PassageStoreResult};
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryPassageStore;
pub use model::{ArchivedPassage, ArchivedTopicRecord, Passage, TopicRecord};

/// Read access to one corpus of topic passages.
pub trait PassageStore: Send + Sync {
    /// Corpus name; part of every index and retrieval cache key.
    fn name(&self) -> &str;

    /// Returns the topic's passages in stored order, or `None` if the topic is unknown.
    fn get_passages(&self, topic: &str) -> PassageStoreResult<Option<Arc<[Passage]>>>;

    /// Returns `true` if the topic has at least one passage.
    fn contains_topic(&self, topic: &str) -> PassageStoreResult<bool> {
        Ok(self.get_passages(topic)?.is_some())
    }
}
