//! In-memory [`PostStore`] for tests and embedding.

use std::sync::RwLock;

use super::{PostStore, StoreError};
use crate::models::PostRecord;

/// Holds the list behind a `RwLock`. Starts empty-and-absent, like a
/// store file that has never been written.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    posts: RwLock<Option<Vec<PostRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `posts`.
    pub fn with_posts(posts: Vec<PostRecord>) -> Self {
        Self {
            posts: RwLock::new(Some(posts)),
        }
    }
}

impl PostStore for InMemoryStore {
    fn load(&self) -> Result<Vec<PostRecord>, StoreError> {
        let guard = self.posts.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(StoreError::Missing)
    }

    fn save(&self, posts: &[PostRecord]) -> Result<(), StoreError> {
        let mut guard = self.posts.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(posts.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
