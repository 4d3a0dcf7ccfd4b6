//! # DocSync Sync
//!
//! Hydration state machine and write coordination for DocSync.
//!
//! This crate provides:
//! - [`SyncCoordinator`], owning the active backend and the in-memory cache
//! - The lifecycle (uninitialized → hydrating → ready)
//! - Backend switching with re-hydration
//! - Document number allocation against a refreshed numbering table
//!
//! ## Key Invariants
//!
//! - No backend write is issued before a hydration completes
//! - Every mutation issues at most one full-snapshot write
//! - A failed hydration leaves the previous cache untouched
//! - The coordinator never changes backend on its own; callers decide

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod state;

pub use config::SyncConfig;
pub use coordinator::{DuplicateReport, HydrationReport, SellerUpdate, SyncCoordinator, WriteOutcome};
pub use error::{SyncError, SyncResult};
pub use state::{SyncState, SyncStats};
