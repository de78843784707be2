//! Passage model types.

use rkyv::Archive;

use crate::hashing::passage_id;

/// One fixed-size chunk of reference text for a topic.
///
/// Archived with `rkyv` in the passage store and serialized with `serde` in the
/// retrieval cache.
#[derive(
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
)]
pub struct Passage {
    /// Topic the passage was chunked from.
    pub title: String,
    /// Passage body.
    pub text: String,
}

impl Passage {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    /// Identity used to merge the same passage returned by different retrievers.
    pub fn id(&self) -> u64 {
        passage_id(&self.title, &self.text)
    }
}

/// On-disk record: all passages of one topic, in order.
#[derive(Archive, rkyv::Serialize, rkyv::Deserialize, Debug, Clone, PartialEq)]
pub struct TopicRecord {
    pub topic: String,
    pub passages: Vec<Passage>,
}
