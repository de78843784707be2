//! Evidence retrieval: per-corpus [`Retriever`]s composed into a [`RetrievalSystem`].
//!
//! With one retriever over one corpus the native top-k is returned as is.
//! Otherwise each family's per-corpus lists are concatenated and re-sorted by
//! that family's native [`ScoreOrder`](crate::index::ScoreOrder), then the
//! families are merged with reciprocal rank fusion.

mod error;
pub mod evidence;
pub mod fusion;
pub mod retriever;
pub mod system;


pub use error::{RetrievalError, RetrievalResult};
pub use evidence::Evidence;
pub use fusion::{FusedPassage, fuse_ranked_lists, merge_corpora, rrf_contribution};
pub use retriever::Retriever;
pub use system::{RetrievalConfig, RetrievalSystem};
