//! Hydration and write coordination over the active backend.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::state::{SyncState, SyncStats};
use chrono::{NaiveDate, Utc};
use docsync_core::{
    allocate, merge_counter_maps, merge_records_by_id, Allocation, CollectionName, CounterMap,
    Record, SellerProfile, SELLER_FILE,
};
use docsync_storage::{Backend, BackendKind, StoreBackend};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Whether a mutation reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The full snapshot was written.
    Written,
    /// The coordinator was not ready; only the cache was updated.
    Suppressed,
}

/// Redundant replica counts per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    counts: BTreeMap<CollectionName, usize>,
}

impl DuplicateReport {
    /// Redundant replicas behind `name`.
    pub fn get(&self, name: CollectionName) -> usize {
        self.counts.get(&name).copied().unwrap_or(0)
    }

    /// Returns true if any collection has more than one replica.
    pub fn has_duplicates(&self) -> bool {
        self.counts.values().any(|&count| count > 0)
    }

    /// Total redundant replicas.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Iterates over every collection and its count.
    pub fn iter(&self) -> impl Iterator<Item = (CollectionName, usize)> + '_ {
        self.counts.iter().map(|(&name, &count)| (name, count))
    }
}

/// What a hydration loaded.
#[derive(Debug, Clone)]
pub struct HydrationReport {
    /// Backend the data came from.
    pub backend: BackendKind,
    /// Record count per collection.
    pub records: BTreeMap<CollectionName, usize>,
    /// Redundant replicas per collection.
    pub duplicates: DuplicateReport,
    /// Keys in the numbering table.
    pub counter_keys: usize,
}

/// Result of [`SyncCoordinator::update_seller`].
#[derive(Debug, Clone)]
pub struct SellerUpdate {
    /// The new profile.
    pub profile: SellerProfile,
    /// Whether it was persisted.
    pub outcome: WriteOutcome,
}

/// Everything loaded by a successful hydration.
struct Loaded {
    collections: BTreeMap<CollectionName, Vec<Record>>,
    duplicates: DuplicateReport,
    counters: CounterMap,
    seller: SellerProfile,
}

/// Owns the active backend and the in-memory cache.
///
/// Mutations update the cache first and issue exactly one full-snapshot
/// backend write, but only once a hydration has completed. Writes attempted
/// while uninitialized or hydrating are suppressed so a half-loaded cache
/// never overwrites remote data.
pub struct SyncCoordinator {
    config: SyncConfig,
    backend: Backend,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    collections: BTreeMap<CollectionName, Vec<Record>>,
    duplicates: DuplicateReport,
    counters: CounterMap,
    seller: SellerProfile,
}

impl SyncCoordinator {
    /// Creates a coordinator. Call [`hydrate`](Self::hydrate) before use.
    pub fn new(config: SyncConfig, backend: impl Into<Backend>) -> Self {
        let counters = CounterMap::initial(config.default_year);
        Self {
            config,
            backend: backend.into(),
            state: RwLock::new(SyncState::Uninitialized),
            stats: RwLock::new(SyncStats::default()),
            collections: BTreeMap::new(),
            duplicates: DuplicateReport::default(),
            counters,
            seller: SellerProfile::default(),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns which backend is active.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Returns the active backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Cached records of `name`.
    pub fn collection(&self, name: CollectionName) -> &[Record] {
        self.collections.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cached numbering table.
    pub fn counters(&self) -> &CounterMap {
        &self.counters
    }

    /// Cached seller profile.
    pub fn seller(&self) -> &SellerProfile {
        &self.seller
    }

    /// Redundant replica counts from the last hydration.
    pub fn duplicates(&self) -> &DuplicateReport {
        &self.duplicates
    }

    fn transition(&self, to: SyncState) -> SyncResult<()> {
        let mut state = self.state.write();
        let from = *state;
        if !from.can_transition_to(to) {
            return Err(SyncError::InvalidStateTransition { from, to });
        }
        debug!(%from, %to, "state transition");
        *state = to;
        Ok(())
    }

    fn record_error(&self, error: &SyncError) {
        self.stats.write().last_error = Some(error.to_string());
    }

    /// Loads every collection, the numbering table and the seller profile
    /// from the active backend.
    ///
    /// The cache is replaced only if every read succeeds. On failure the
    /// coordinator returns to [`SyncState::Uninitialized`].
    ///
    /// # Errors
    ///
    /// Returns the backend error, or [`SyncError::InvalidStateTransition`]
    /// if a hydration is already running.
    pub async fn hydrate(&mut self) -> SyncResult<HydrationReport> {
        self.transition(SyncState::Hydrating)?;

        match self.load().await {
            Ok(loaded) => {
                self.collections = loaded.collections;
                self.duplicates = loaded.duplicates;
                self.counters = loaded.counters;
                self.seller = loaded.seller;
                self.transition(SyncState::Ready)?;

                {
                    let mut stats = self.stats.write();
                    stats.hydrations += 1;
                    stats.last_hydration = Some(Utc::now());
                }

                let report = HydrationReport {
                    backend: self.backend.kind(),
                    records: self
                        .collections
                        .iter()
                        .map(|(&name, items)| (name, items.len()))
                        .collect(),
                    duplicates: self.duplicates.clone(),
                    counter_keys: self.counters.len(),
                };
                info!(
                    backend = %report.backend,
                    duplicates = report.duplicates.total(),
                    "hydration complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(backend = %self.backend.kind(), error = %e, "hydration failed");
                self.record_error(&e);
                self.transition(SyncState::Uninitialized)?;
                Err(e)
            }
        }
    }

    async fn load(&mut self) -> SyncResult<Loaded> {
        self.backend.init().await?;

        let snapshot = self
            .backend
            .read_all_merged(CounterMap::initial(self.config.default_year))
            .await?;

        let mut collections = BTreeMap::new();
        let mut duplicates = DuplicateReport::default();
        for (name, merged) in snapshot.collections {
            if merged.dup_count > 0 {
                warn!(
                    collection = %name,
                    duplicates = merged.dup_count,
                    "collection has duplicate replicas"
                );
            }
            duplicates.counts.insert(name, merged.dup_count);
            collections.insert(name, merged.items);
        }
        let counters = snapshot.counters;

        let stored = self.backend.read_one(SELLER_FILE, Value::Null).await?;
        let seller = if stored.is_null() {
            SellerProfile::default()
        } else {
            SellerProfile::from_value(&stored).unwrap_or_else(|| {
                warn!("stored seller profile is malformed, using default");
                SellerProfile::default()
            })
        };

        Ok(Loaded {
            collections,
            duplicates,
            counters,
            seller,
        })
    }

    /// Replaces the active backend and re-hydrates from it.
    ///
    /// Work already issued against the previous backend is neither awaited
    /// nor aborted.
    ///
    /// # Errors
    ///
    /// Returns the hydration error; the new backend stays active.
    pub async fn switch_backend(
        &mut self,
        backend: impl Into<Backend>,
    ) -> SyncResult<HydrationReport> {
        self.backend = backend.into();
        info!(backend = %self.backend.kind(), "switched backend");
        self.hydrate().await
    }

    /// Counts a suppressed write, or returns true if the write should go out.
    fn should_write(&self, name: &str) -> bool {
        let state = self.state();
        if state.is_ready() {
            return true;
        }
        debug!(name, state = %state, "write suppressed");
        self.stats.write().writes_suppressed += 1;
        false
    }

    fn written(&self, result: SyncResult<()>) -> SyncResult<WriteOutcome> {
        match result {
            Ok(()) => {
                self.stats.write().writes_issued += 1;
                Ok(WriteOutcome::Written)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    async fn persist_collection(&self, name: CollectionName) -> SyncResult<WriteOutcome> {
        if !self.should_write(name.file_name()) {
            return Ok(WriteOutcome::Suppressed);
        }
        let result = self
            .backend
            .write_collection(name, self.collection(name))
            .await
            .map_err(SyncError::from);
        self.written(result)
    }

    /// Replaces a whole collection.
    ///
    /// Records sharing an id are collapsed, the last one winning.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the write fails; the cache keeps the
    /// new snapshot.
    pub async fn replace_collection(
        &mut self,
        name: CollectionName,
        items: Vec<Record>,
    ) -> SyncResult<WriteOutcome> {
        self.collections.insert(name, merge_records_by_id([items]));
        self.persist_collection(name).await
    }

    /// Inserts a record, or replaces the cached record with the same id.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the write fails.
    pub async fn upsert_record(
        &mut self,
        name: CollectionName,
        record: Record,
    ) -> SyncResult<WriteOutcome> {
        let items = self.collections.entry(name).or_default();
        match items.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => items.push(record),
        }
        self.persist_collection(name).await
    }

    /// Replaces the numbering table.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the write fails.
    pub async fn replace_counters(&mut self, counters: CounterMap) -> SyncResult<WriteOutcome> {
        self.counters = counters;
        if !self.should_write(docsync_core::COUNTERS_FILE) {
            return Ok(WriteOutcome::Suppressed);
        }
        let result = self
            .backend
            .write_counter_map(&self.counters)
            .await
            .map_err(SyncError::from);
        self.written(result)
    }

    /// Applies `patch` to the seller profile and persists the new profile.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Core`] if a patched field has the wrong type
    /// (nothing changes), or the backend error if the write fails.
    pub async fn update_seller(&mut self, patch: &Map<String, Value>) -> SyncResult<SellerUpdate> {
        let profile = self.seller.patched(patch)?;
        self.seller = profile.clone();

        if !self.should_write(SELLER_FILE) {
            return Ok(SellerUpdate {
                profile,
                outcome: WriteOutcome::Suppressed,
            });
        }
        let value = serde_json::to_value(&profile).map_err(docsync_core::CoreError::from)?;
        let result = self
            .backend
            .write_one(SELLER_FILE, &value)
            .await
            .map_err(SyncError::from);
        let outcome = self.written(result)?;
        Ok(SellerUpdate { profile, outcome })
    }

    /// Allocates and persists the next document number for `series` in
    /// the year of `date`.
    ///
    /// The backend's numbering table is re-read and max-merged with the
    /// cache first. Two sessions allocating at the same moment can still
    /// receive the same number.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotReady`] before hydration completes,
    /// [`SyncError::Core`] for an invalid series, or the backend error.
    pub async fn next_number(&mut self, series: &str, date: NaiveDate) -> SyncResult<Allocation> {
        let state = self.state();
        if !state.is_ready() {
            return Err(SyncError::NotReady { state });
        }

        let fresh = match self.backend.read_counter_map(CounterMap::new()).await {
            Ok(fresh) => fresh,
            Err(e) => {
                let e = SyncError::from(e);
                self.record_error(&e);
                return Err(e);
            }
        };
        let base = merge_counter_maps([&self.counters, &fresh]);
        let allocation = allocate(&base, series, date)?;

        let result = self
            .backend
            .write_counter_map(&allocation.counters)
            .await
            .map_err(SyncError::from);
        self.written(result)?;

        self.counters = allocation.counters.clone();
        info!(key = %allocation.key, number = allocation.number, "allocated document number");
        Ok(allocation)
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("backend", &self.backend.kind())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_storage::{LocalBackend, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn local() -> (Arc<MemoryStore>, LocalBackend) {
        let store = Arc::new(MemoryStore::new());
        let backend = LocalBackend::new(store.clone());
        (store, backend)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn starts_uninitialized_with_defaults() {
        let (_, backend) = local();
        let coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        assert_eq!(coordinator.state(), SyncState::Uninitialized);
        assert_eq!(coordinator.counters(), &CounterMap::initial(2025));
        assert!(coordinator.collection(CollectionName::Customers).is_empty());
        assert_eq!(coordinator.backend_kind(), BackendKind::Local);
    }

    #[tokio::test]
    async fn writes_before_hydration_are_suppressed() {
        let (store, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);

        let outcome = coordinator
            .upsert_record(CollectionName::Customers, Record::new("c1").unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Suppressed);
        assert_eq!(coordinator.collection(CollectionName::Customers).len(), 1);
        assert!(store.raw(docsync_storage::DEFAULT_NAMESPACE).is_none());
        assert_eq!(coordinator.stats().writes_suppressed, 1);
        assert_eq!(coordinator.stats().writes_issued, 0);
    }

    #[tokio::test]
    async fn hydration_enables_writes() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend.clone());
        let report = coordinator.hydrate().await.unwrap();
        assert_eq!(report.backend, BackendKind::Local);
        assert!(!report.duplicates.has_duplicates());
        assert_eq!(coordinator.state(), SyncState::Ready);

        let outcome = coordinator
            .upsert_record(CollectionName::Products, Record::new("p1").unwrap().with_field("price", 10))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);
        coordinator
            .upsert_record(CollectionName::Products, Record::new("p1").unwrap().with_field("price", 12))
            .await
            .unwrap();

        let read = backend.read_collection(CollectionName::Products).await.unwrap();
        assert_eq!(read.items.len(), 1);
        assert_eq!(read.items[0].get("price"), Some(&json!(12)));
        assert_eq!(coordinator.stats().writes_issued, 2);
    }

    #[tokio::test]
    async fn replace_collection_collapses_ids() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        coordinator.hydrate().await.unwrap();

        coordinator
            .replace_collection(
                CollectionName::Invoices,
                vec![
                    Record::new("f1").unwrap().with_field("v", 1),
                    Record::new("f1").unwrap().with_field("v", 2),
                ],
            )
            .await
            .unwrap();
        let items = coordinator.collection(CollectionName::Invoices);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("v"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn next_number_requires_ready() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        let err = coordinator
            .next_number("A", date("2025-03-01"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::NotReady {
                state: SyncState::Uninitialized
            }
        ));
    }

    #[tokio::test]
    async fn next_number_is_sequential_and_persisted() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend.clone());
        coordinator.hydrate().await.unwrap();

        let first = coordinator.next_number("A", date("2025-03-01")).await.unwrap();
        let second = coordinator.next_number("A", date("2025-07-15")).await.unwrap();
        let other = coordinator.next_number("B", date("2025-07-15")).await.unwrap();
        assert_eq!((first.number, second.number, other.number), (1, 2, 1));
        assert_eq!(coordinator.counters().last("A-2025"), Some(2));

        let stored = backend.read_counter_map(CounterMap::new()).await.unwrap();
        assert_eq!(stored.last("A-2025"), Some(2));
        assert_eq!(stored.last("B-2025"), Some(1));
    }

    #[tokio::test]
    async fn next_number_sees_backend_updates() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend.clone());
        coordinator.hydrate().await.unwrap();

        let mut elsewhere = CounterMap::new();
        elsewhere.set("A-2025", 41);
        backend.write_counter_map(&elsewhere).await.unwrap();

        let allocation = coordinator.next_number("A", date("2025-01-02")).await.unwrap();
        assert_eq!(allocation.number, 42);
    }

    #[tokio::test]
    async fn invalid_series_is_core_error() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        coordinator.hydrate().await.unwrap();
        let err = coordinator
            .next_number("", date("2025-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Core(_)));
    }

    #[tokio::test]
    async fn seller_update_returns_new_profile() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend.clone());
        coordinator.hydrate().await.unwrap();

        let patch = json!({"name": "Transportes Norte S.L."});
        let update = coordinator
            .update_seller(patch.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(update.outcome, WriteOutcome::Written);
        assert_eq!(update.profile.name, "Transportes Norte S.L.");
        assert_eq!(coordinator.seller(), &update.profile);

        let stored = backend.read(SELLER_FILE, Value::Null);
        assert_eq!(stored["name"], json!("Transportes Norte S.L."));
    }

    #[tokio::test]
    async fn mistyped_seller_patch_changes_nothing() {
        let (_, backend) = local();
        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        coordinator.hydrate().await.unwrap();

        let patch = json!({"name": 42});
        assert!(coordinator
            .update_seller(patch.as_object().unwrap())
            .await
            .is_err());
        assert_eq!(coordinator.seller(), &SellerProfile::default());
    }

    #[tokio::test]
    async fn hydration_reads_stored_data() {
        let (_, backend) = local();
        backend
            .write("albaranes.json", json!([{"id": "a1"}, {"id": "a2"}]))
            .unwrap();
        backend
            .write("seller.json", json!({"name": "Stored S.L."}))
            .unwrap();
        backend
            .write("secuencias.json", json!({"A-2024": {"last": 90}}))
            .unwrap();

        let mut coordinator = SyncCoordinator::new(SyncConfig::default(), backend);
        let report = coordinator.hydrate().await.unwrap();
        assert_eq!(report.records[&CollectionName::DeliveryNotes], 2);
        assert_eq!(coordinator.seller().name, "Stored S.L.");
        assert_eq!(coordinator.counters().last("A-2024"), Some(90));
        assert_eq!(coordinator.counters().last("A-2025"), None);
        assert_eq!(coordinator.stats().hydrations, 1);
        assert!(coordinator.stats().last_hydration.is_some());
    }
}
