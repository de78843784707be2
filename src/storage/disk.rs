//! Disk-backed passage store (one rkyv archive per topic).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use moka::sync::Cache;
use rkyv::rancor::Error as RkyvError;
use tracing::debug;

use super::PassageStore;
use super::chunk::chunk_passages;
use super::error::{PassageStoreError, PassageStoreResult};
use super::mmap::MmapFileHandle;
use super::model::{ArchivedTopicRecord, Passage, TopicRecord};
use crate::hashing::topic_file_stem;

const RKYV_EXTENSION: &str = "rkyv";

const TEMP_EXTENSION: &str = "rkyv.tmp";

const DEFAULT_LOADED_TOPICS: u64 = 4_096;

/// Read-mostly passage archive rooted at a directory.
///
/// Topics are decoded from their memory-mapped archive once and kept in a
/// bounded in-memory cache afterwards.
pub struct DiskPassageStore {
    name: String,
    root: PathBuf,
    loaded: Cache<String, Arc<[Passage]>>,
}

impl std::fmt::Debug for DiskPassageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskPassageStore")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("loaded", &self.loaded.entry_count())
            .finish()
    }
}

impl DiskPassageStore {
    /// Opens a store rooted at `root`. The directory does not need to exist yet.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            loaded: Cache::builder().max_capacity(DEFAULT_LOADED_TOPICS).build(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn topic_path(&self, topic: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", topic_file_stem(topic), RKYV_EXTENSION))
    }

    fn temp_topic_path(&self, topic: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", topic_file_stem(topic), TEMP_EXTENSION))
    }

    fn ensure_root(&self) -> PassageStoreResult<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|_| PassageStoreError::StorageUnavailable {
                path: self.root.clone(),
            })?;
        }
        Ok(())
    }

    /// Writes all passages of `topic`, replacing any previous archive.
    pub fn put_topic(&self, topic: &str, passages: Vec<Passage>) -> PassageStoreResult<()> {
        self.ensure_root()?;

        let record = TopicRecord {
            topic: topic.to_string(),
            passages,
        };
        let bytes = rkyv::to_bytes::<RkyvError>(&record)
            .map_err(|e| PassageStoreError::Serialization(format!("{:?}", e)))?;

        let temp_path = self.temp_topic_path(topic);
        let final_path = self.topic_path(topic);

        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &final_path)?;
        self.loaded.invalidate(topic);

        debug!(
            topic = %topic,
            passages = record.passages.len(),
            "Stored topic passages"
        );
        Ok(())
    }

    /// Chunks `text` into fixed windows and stores the result under `topic`.
    pub fn put_document(
        &self,
        topic: &str,
        text: &str,
        tokens_per_passage: usize,
    ) -> PassageStoreResult<usize> {
        let passages = chunk_passages(topic, text, tokens_per_passage);
        let count = passages.len();
        self.put_topic(topic, passages)?;
        Ok(count)
    }

    /// Deletes a topic. Returns `false` if it was not stored.
    pub fn delete_topic(&self, topic: &str) -> PassageStoreResult<bool> {
        let path = self.topic_path(topic);
        self.loaded.invalidate(topic);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    fn load_topic(&self, topic: &str) -> PassageStoreResult<Option<Arc<[Passage]>>> {
        let path = self.topic_path(topic);
        if !path.exists() {
            return Ok(None);
        }

        let handle = MmapFileHandle::open(&path)?;
        let archived = handle.access_archived::<ArchivedTopicRecord>()?;

        if archived.topic.as_str() != topic {
            return Err(PassageStoreError::Corrupt {
                path,
                reason: format!(
                    "archive belongs to topic '{}'",
                    archived.topic.as_str()
                ),
            });
        }

        let record: TopicRecord = rkyv::deserialize::<TopicRecord, RkyvError>(archived)
            .map_err(|e| PassageStoreError::Serialization(format!("{:?}", e)))?;

        Ok(Some(Arc::from(record.passages)))
    }
}

impl PassageStore for DiskPassageStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_passages(&self, topic: &str) -> PassageStoreResult<Option<Arc<[Passage]>>> {
        if let Some(passages) = self.loaded.get(topic) {
            return Ok(Some(passages));
        }

        match self.load_topic(topic)? {
            Some(passages) if !passages.is_empty() => {
                self.loaded.insert(topic.to_string(), Arc::clone(&passages));
                Ok(Some(passages))
            }
            _ => Ok(None),
        }
    }
}
