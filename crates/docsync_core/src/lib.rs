//! # DocSync Core
//!
//! Record model, merge engine and sequence allocation for DocSync.
//!
//! This crate provides:
//! - [`Record`] and [`CollectionName`] for the business collections
//! - [`CounterMap`] for document numbering
//! - Id-keyed record merge and max-merge of counter maps
//! - Pure sequence allocation per series and year
//! - [`SellerProfile`] for the issuing company's identity
//!
//! This is a pure crate with no I/O operations. Backends and the sync
//! coordinator live in `docsync_storage` and `docsync_sync`.
//!
//! ## Key Invariants
//!
//! - After a merge a collection holds at most one record per `id`
//! - A merged counter never decreases
//! - Merges never discard a record whose id appears in any input
//!
//! ## Example
//!
//! ```rust
//! use docsync_core::{merge_records_by_id, Record};
//!
//! let a = vec![Record::new("c1").unwrap(), Record::new("c2").unwrap()];
//! let b = vec![Record::new("c2").unwrap(), Record::new("c3").unwrap()];
//! let merged = merge_records_by_id([a, b]);
//! assert_eq!(merged.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod counter;
mod error;
mod merge;
mod record;
mod seller;
mod sequence;

pub use counter::{CounterEntry, CounterMap, COUNTERS_FILE};
pub use error::{CoreError, CoreResult};
pub use merge::{
    dedupe_by_id, merge_counter_maps, merge_records_by_id, merge_values_by_id,
    overlay_counter_map,
};
pub use record::{CollectionName, Record};
pub use seller::{SellerProfile, SELLER_FILE};
pub use sequence::{allocate, parse_document_date, Allocation, SequenceKey};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
