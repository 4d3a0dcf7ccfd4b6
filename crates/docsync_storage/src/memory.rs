//! In-memory local blob store for testing.

use crate::error::StorageResult;
use crate::local::LocalStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory local blob store.
///
/// Suitable for unit tests and for ephemeral sessions that should not
/// touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one pre-existing entry.
    ///
    /// Useful for testing how unreadable content is handled.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.write().insert(key.into(), contents.into());
        store
    }

    /// Returns the raw contents stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

impl LocalStore for MemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn save(&self, key: &str, contents: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_owned(), contents.to_owned());
        Ok(())
    }
}
