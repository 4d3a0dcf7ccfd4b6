//! Local single-replica backend.
//!
//! Everything lives under one namespaced key as a single JSON object whose
//! top-level keys are storage names (`customers.json`, `secuencias.json`,
//! ...) and whose values are each name's raw payload. There is exactly one
//! replica per name, so nothing needs merging.

use crate::backend::{BackendKind, CollectionRead, StoreBackend};
use crate::error::StorageResult;
use async_trait::async_trait;
use docsync_core::{dedupe_by_id, CollectionName, CounterMap, Record, COUNTERS_FILE};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default namespace key, shared with earlier deployments.
pub const DEFAULT_NAMESPACE: &str = "fsclone-cloud-v6";

/// A key/value blob store holding raw strings.
///
/// # Implementors
///
/// - [`crate::FileStore`] - one file per key in a directory
/// - [`crate::MemoryStore`] - for tests
pub trait LocalStore: Send + Sync {
    /// Loads the contents stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the key exists but cannot be read.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the contents stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the contents cannot be persisted.
    fn save(&self, key: &str, contents: &str) -> StorageResult<()>;
}

/// Local backend over a [`LocalStore`].
#[derive(Clone)]
pub struct LocalBackend {
    store: Arc<dyn LocalStore>,
    namespace: String,
}

impl LocalBackend {
    /// Creates a backend using [`DEFAULT_NAMESPACE`].
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    /// Creates a backend using a custom namespace key.
    pub fn with_namespace(store: Arc<dyn LocalStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Returns the namespace key.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Loads the namespace object. Unreadable content counts as empty.
    fn load_all(&self) -> Map<String, Value> {
        match self.store.load(&self.namespace) {
            Ok(contents) => self.parse_all(contents),
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "local store unreadable, treating as empty");
                Map::new()
            }
        }
    }

    /// Loads the namespace object as the base of a write.
    ///
    /// A failing store is an error here: writing over an empty base would
    /// drop every other name. Content that does not parse still starts fresh.
    fn load_for_write(&self) -> StorageResult<Map<String, Value>> {
        let contents = self.store.load(&self.namespace)?;
        Ok(self.parse_all(contents))
    }

    fn parse_all(&self, contents: Option<String>) -> Map<String, Value> {
        let Some(contents) = contents else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(all)) => all,
            Ok(_) => {
                warn!(namespace = %self.namespace, "local store is not a JSON object, treating as empty");
                Map::new()
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "local store is not valid JSON, treating as empty");
                Map::new()
            }
        }
    }

    /// Returns the value stored for `name`, or `fallback`. Never fails.
    pub fn read(&self, name: &str, fallback: Value) -> Value {
        self.load_all().remove(name).unwrap_or(fallback)
    }

    /// Replaces the value stored for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot load or persist the namespace
    /// object. Nothing is written when the load fails.
    pub fn write(&self, name: &str, value: Value) -> StorageResult<()> {
        let mut all = self.load_for_write()?;
        all.insert(name.to_owned(), value);
        let contents = serde_json::to_string(&Value::Object(all))?;
        self.store.save(&self.namespace, &contents)?;
        debug!(namespace = %self.namespace, name, "local write");
        Ok(())
    }

    /// Returns the storage names currently present.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.load_all().keys().cloned().collect()
    }
}

#[async_trait]
impl StoreBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn init(&mut self) -> StorageResult<()> {
        Ok(())
    }

    async fn read_one(&self, name: &str, fallback: Value) -> StorageResult<Value> {
        Ok(self.read(name, fallback))
    }

    async fn write_one(&self, name: &str, value: &Value) -> StorageResult<()> {
        self.write(name, value.clone())
    }

    async fn read_collection(&self, name: CollectionName) -> StorageResult<CollectionRead> {
        let read = match self.load_all().remove(name.file_name()) {
            None => CollectionRead::default(),
            Some(Value::Array(values)) => CollectionRead {
                items: dedupe_by_id(values),
                replica_count: 1,
            },
            Some(_) => {
                warn!(collection = %name, "local collection is not an array, treating as empty");
                CollectionRead {
                    items: Vec::new(),
                    replica_count: 1,
                }
            }
        };
        Ok(read)
    }

    async fn write_collection(&self, name: CollectionName, items: &[Record]) -> StorageResult<()> {
        self.write(name.file_name(), serde_json::to_value(items)?)
    }

    async fn read_counter_map(&self, fallback: CounterMap) -> StorageResult<CounterMap> {
        let stored = self
            .load_all()
            .remove(COUNTERS_FILE)
            .and_then(|value| CounterMap::from_value(&value))
            .filter(|counters| !counters.is_empty());
        Ok(stored.unwrap_or(fallback))
    }

    async fn write_counter_map(&self, counters: &CounterMap) -> StorageResult<()> {
        self.write(COUNTERS_FILE, serde_json::to_value(counters)?)
    }
}
