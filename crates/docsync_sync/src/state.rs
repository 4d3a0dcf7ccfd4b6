//! Coordinator lifecycle and statistics.

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle of a [`crate::SyncCoordinator`].
///
/// ```text
/// Uninitialized ──hydrate──▶ Hydrating ──ok──▶ Ready
///       ▲                        │               │
///       └────────failed──────────┘◀──re-hydrate──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing loaded yet, or the last hydration failed.
    Uninitialized,
    /// A hydration is in progress.
    Hydrating,
    /// The cache reflects the backend; writes are issued.
    Ready,
}

impl SyncState {
    /// Returns true if mutations are persisted.
    pub fn is_ready(&self) -> bool {
        matches!(self, SyncState::Ready)
    }

    /// Returns true if a hydration may start.
    pub fn can_hydrate(&self) -> bool {
        matches!(self, SyncState::Uninitialized | SyncState::Ready)
    }

    /// Returns true if `self → to` is a legal transition.
    pub fn can_transition_to(&self, to: SyncState) -> bool {
        match (self, to) {
            (SyncState::Uninitialized | SyncState::Ready, SyncState::Hydrating) => true,
            (SyncState::Hydrating, SyncState::Ready | SyncState::Uninitialized) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::Hydrating => "hydrating",
            SyncState::Ready => "ready",
        })
    }
}

/// Statistics about coordinator activity.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Completed hydrations.
    pub hydrations: u64,
    /// Backend writes issued.
    pub writes_issued: u64,
    /// Writes skipped because the coordinator was not ready.
    pub writes_suppressed: u64,
    /// Last hydration completion time.
    pub last_hydration: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
}
