//! Backend capability trait shared by the local and remote backends.

use crate::error::StorageResult;
use crate::local::LocalBackend;
use crate::remote::RemoteBackend;
use async_trait::async_trait;
use docsync_core::{CollectionName, CounterMap, Record};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which backend variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local single-replica store.
    Local,
    /// Replicated remote object store.
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// A collection as read from a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRead {
    /// Merged records, at most one per id.
    pub items: Vec<Record>,
    /// Number of physical replicas the records were merged from.
    pub replica_count: usize,
}

impl CollectionRead {
    /// Number of redundant replicas: `max(0, replica_count - 1)`.
    #[must_use]
    pub fn dup_count(&self) -> usize {
        self.replica_count.saturating_sub(1)
    }
}

/// One merged collection inside a [`MergedSnapshot`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedCollection {
    /// Merged records.
    pub items: Vec<Record>,
    /// Redundant replica count (always 0 for the local backend).
    pub dup_count: usize,
}

/// Everything a backend holds, merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSnapshot {
    /// Every collection keyed by name.
    pub collections: BTreeMap<CollectionName, MergedCollection>,
    /// Merged numbering table.
    pub counters: CounterMap,
}

/// The capability set every backend provides.
///
/// The coordinator only talks to this trait, so no call site branches on
/// which backend is active.
///
/// # Invariants
///
/// - Writes are full-snapshot: the value passed is the whole content
/// - Reads never fail because one replica is malformed
/// - A name with no stored data yields the fallback, not an error
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Returns the backend variant.
    fn kind(&self) -> BackendKind;

    /// Prepares the backend for use.
    ///
    /// # Errors
    ///
    /// Remote backends fail here if authorization or folder setup fails.
    async fn init(&mut self) -> StorageResult<()>;

    /// Reads a single JSON document, or `fallback` if absent.
    async fn read_one(&self, name: &str, fallback: Value) -> StorageResult<Value>;

    /// Writes a single JSON document.
    async fn write_one(&self, name: &str, value: &Value) -> StorageResult<()>;

    /// Reads and merges a collection.
    async fn read_collection(&self, name: CollectionName) -> StorageResult<CollectionRead>;

    /// Persists a full collection snapshot.
    async fn write_collection(&self, name: CollectionName, items: &[Record]) -> StorageResult<()>;

    /// Reads the numbering table, or `fallback` if absent or empty.
    async fn read_counter_map(&self, fallback: CounterMap) -> StorageResult<CounterMap>;

    /// Persists the numbering table.
    async fn write_counter_map(&self, counters: &CounterMap) -> StorageResult<()>;

    /// Reads every collection and the numbering table.
    async fn read_all_merged(&self, counter_fallback: CounterMap) -> StorageResult<MergedSnapshot> {
        let mut collections = BTreeMap::new();
        for name in CollectionName::ALL {
            let read = self.read_collection(name).await?;
            let dup_count = read.dup_count();
            collections.insert(
                name,
                MergedCollection {
                    items: read.items,
                    dup_count,
                },
            );
        }
        let counters = self.read_counter_map(counter_fallback).await?;
        Ok(MergedSnapshot {
            collections,
            counters,
        })
    }
}

/// The active backend: one of the two variants behind one interface.
pub enum Backend {
    /// Local single-replica store.
    Local(LocalBackend),
    /// Replicated remote object store.
    Remote(RemoteBackend),
}

impl From<LocalBackend> for Backend {
    fn from(backend: LocalBackend) -> Self {
        Backend::Local(backend)
    }
}

impl From<RemoteBackend> for Backend {
    fn from(backend: RemoteBackend) -> Self {
        Backend::Remote(backend)
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backend").field(&self.kind()).finish()
    }
}

#[async_trait]
impl StoreBackend for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Local(b) => b.kind(),
            Backend::Remote(b) => b.kind(),
        }
    }

    async fn init(&mut self) -> StorageResult<()> {
        match self {
            Backend::Local(b) => b.init().await,
            Backend::Remote(b) => b.init().await,
        }
    }

    async fn read_one(&self, name: &str, fallback: Value) -> StorageResult<Value> {
        match self {
            Backend::Local(b) => b.read_one(name, fallback).await,
            Backend::Remote(b) => b.read_one(name, fallback).await,
        }
    }

    async fn write_one(&self, name: &str, value: &Value) -> StorageResult<()> {
        match self {
            Backend::Local(b) => b.write_one(name, value).await,
            Backend::Remote(b) => b.write_one(name, value).await,
        }
    }

    async fn read_collection(&self, name: CollectionName) -> StorageResult<CollectionRead> {
        match self {
            Backend::Local(b) => b.read_collection(name).await,
            Backend::Remote(b) => b.read_collection(name).await,
        }
    }

    async fn write_collection(&self, name: CollectionName, items: &[Record]) -> StorageResult<()> {
        match self {
            Backend::Local(b) => b.write_collection(name, items).await,
            Backend::Remote(b) => b.write_collection(name, items).await,
        }
    }

    async fn read_counter_map(&self, fallback: CounterMap) -> StorageResult<CounterMap> {
        match self {
            Backend::Local(b) => b.read_counter_map(fallback).await,
            Backend::Remote(b) => b.read_counter_map(fallback).await,
        }
    }

    async fn write_counter_map(&self, counters: &CounterMap) -> StorageResult<()> {
        match self {
            Backend::Local(b) => b.write_counter_map(counters).await,
            Backend::Remote(b) => b.write_counter_map(counters).await,
        }
    }
}
