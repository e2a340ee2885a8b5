//! Storage abstraction for ingested posts.
//!
//! The [`PostStore`] trait is the only thing ingestion and the query
//! operations know about persistence: a store holds one ordered list of
//! [`PostRecord`]s that is read whole and replaced whole.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`JsonFileStore`] | Pretty-printed JSON file (the default) |
//! | [`InMemoryStore`] | Tests and embedding |
//!
//! Implementations must be `Send + Sync` so one store can be shared across
//! tool invocations behind an `Arc`.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

use crate::models::PostRecord;

/// Why a store could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing has been ingested yet.
    #[error("store does not exist")]
    Missing,

    /// The store exists but is not a valid list of records.
    #[error("store contents are corrupted: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Whole-list persistence for post records.
///
/// Insertion order is preserved and no identity key is enforced: `save`
/// replaces whatever was there, and `load` returns exactly what the last
/// successful `save` wrote.
pub trait PostStore: Send + Sync {
    /// Read every record, in stored order.
    fn load(&self) -> Result<Vec<PostRecord>, StoreError>;

    /// Replace the stored list with `posts`.
    fn save(&self, posts: &[PostRecord]) -> Result<(), StoreError>;

    /// Human-readable location, used in confirmation messages.
    fn location(&self) -> String;
}
