//! # DocSync Storage
//!
//! Local and replicated remote backends for DocSync.
//!
//! Both backends implement [`StoreBackend`]; [`Backend`] wraps whichever
//! one is active so callers never branch on backend identity.
//!
//! ## Design Principles
//!
//! - Writes are full snapshots of one logical name
//! - A malformed replica is logged and treated as empty, never fatal
//! - A name with no stored data yields the caller's fallback
//! - Redundant remote replicas are merged on read and never deleted
//!   implicitly
//!
//! ## Available Backends
//!
//! - [`LocalBackend`] - a single JSON object under one namespaced key of a
//!   [`LocalStore`] ([`FileStore`] or [`MemoryStore`])
//! - [`RemoteBackend`] - a folder of possibly duplicated JSON files behind
//!   an [`ObjectStore`] ([`DriveClient`] or [`MemoryObjectStore`])
//!
//! ## Example
//!
//! ```rust
//! use docsync_core::{CollectionName, Record};
//! use docsync_storage::{LocalBackend, MemoryStore, StoreBackend};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let backend = LocalBackend::new(Arc::new(MemoryStore::new()));
//! backend
//!     .write_collection(CollectionName::Customers, &[Record::new("c1").unwrap()])
//!     .await
//!     .unwrap();
//! let read = backend.read_collection(CollectionName::Customers).await.unwrap();
//! assert_eq!(read.items.len(), 1);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod backend;
mod error;
mod file;
mod local;
mod memory;
pub mod remote;

pub use auth::{AccessToken, StaticTokenProvider, TokenProvider};
pub use backend::{
    Backend, BackendKind, CollectionRead, MergedCollection, MergedSnapshot, StoreBackend,
};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use local::{LocalBackend, LocalStore, DEFAULT_NAMESPACE};
pub use memory::MemoryStore;
pub use remote::{
    CompactTarget, CompactionReport, DriveClient, MemoryObjectStore, ObjectStore, RemoteBackend,
    RemoteConfig, RemoteFile, StorageSession,
};
