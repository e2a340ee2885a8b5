//! JSON file backend.
//!
//! The file holds a single pretty-printed JSON array. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers see either the old list or the new one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{PostStore, StoreError};
use crate::models::PostRecord;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl PostStore for JsonFileStore {
    fn load(&self) -> Result<Vec<PostRecord>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::Missing),
            // Non-UTF-8 bytes are as unreadable as bad JSON.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(StoreError::Corrupt(serde_json::Error::io(e)))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, posts: &[PostRecord]) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, posts)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), count = posts.len(), "store written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
