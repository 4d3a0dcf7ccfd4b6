//! Coordinator scenarios over the local and in-memory remote backends.

use chrono::NaiveDate;
use docsync_core::{CollectionName, Record};
use docsync_storage::{
    BackendKind, LocalBackend, MemoryObjectStore, MemoryStore, RemoteBackend, StaticTokenProvider,
    StoreBackend,
};
use docsync_sync::{SyncConfig, SyncCoordinator, SyncState, WriteOutcome};
use serde_json::json;
use std::sync::Arc;

const DATA: [&str; 2] = ["FSClone", "data"];

fn remote(store: &Arc<MemoryObjectStore>, token: &str) -> RemoteBackend {
    RemoteBackend::new(store.clone(), Arc::new(StaticTokenProvider::new(token)))
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn hydration_matches_read_all_merged() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_file(&DATA, "facturas.json", r#"[{"id":"f1"}]"#);
    store.seed_file(&DATA, "facturas.json", r#"[{"id":"f2"}]"#);
    store.seed_file(&DATA, "products.json", r#"[{"id":"p1"}]"#);
    store.seed_file(&DATA, "secuencias.json", r#"{"A-2025":{"last":9}}"#);

    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    let report = coordinator.hydrate().await.unwrap();

    let snapshot = coordinator
        .backend()
        .read_all_merged(docsync_core::CounterMap::initial(2025))
        .await
        .unwrap();
    for (name, merged) in &snapshot.collections {
        assert_eq!(report.duplicates.get(*name), merged.dup_count, "{name}");
        assert_eq!(coordinator.collection(*name), merged.items.as_slice(), "{name}");
    }
    assert_eq!(report.duplicates.get(CollectionName::Invoices), 1);
    assert_eq!(coordinator.counters(), &snapshot.counters);
}

#[tokio::test]
async fn remote_hydration_reports_duplicates() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_file(&DATA, "customers.json", r#"[{"id":"c1"}]"#);
    store.seed_file(&DATA, "customers.json", r#"[{"id":"c2"}]"#);
    store.seed_file(&DATA, "customers.json", r#"[{"id":"c1","v":2}]"#);

    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    let report = coordinator.hydrate().await.unwrap();

    assert_eq!(report.backend, BackendKind::Remote);
    assert_eq!(report.records[&CollectionName::Customers], 2);
    assert_eq!(coordinator.duplicates().get(CollectionName::Customers), 2);
    assert_eq!(coordinator.duplicates().get(CollectionName::Invoices), 0);
    assert!(coordinator.duplicates().has_duplicates());

    let c1 = coordinator
        .collection(CollectionName::Customers)
        .iter()
        .find(|r| r.id() == "c1")
        .unwrap();
    assert_eq!(c1.get("v"), Some(&json!(2)));
}

#[tokio::test]
async fn no_remote_writes_before_hydration() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));

    let outcome = coordinator
        .replace_collection(CollectionName::Products, vec![Record::new("p1").unwrap()])
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Suppressed);
    assert_eq!(store.write_count(), 0);

    coordinator.hydrate().await.unwrap();
    assert!(coordinator.collection(CollectionName::Products).is_empty());

    coordinator
        .replace_collection(CollectionName::Products, vec![Record::new("p1").unwrap()])
        .await
        .unwrap();
    assert_eq!(store.write_count(), 1);
    assert_eq!(store.replica_count(&DATA, "products.json"), 1);
}

#[tokio::test]
async fn each_mutation_issues_one_write() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    coordinator.hydrate().await.unwrap();

    coordinator
        .upsert_record(CollectionName::Waybills, Record::new("w1").unwrap())
        .await
        .unwrap();
    coordinator
        .upsert_record(CollectionName::Waybills, Record::new("w2").unwrap())
        .await
        .unwrap();
    coordinator
        .update_seller(json!({"city": "Sevilla"}).as_object().unwrap())
        .await
        .unwrap();

    assert_eq!(store.write_count(), 3);
    assert_eq!(coordinator.stats().writes_issued, 3);
    assert_eq!(store.replica_count(&DATA, "cartaportes.json"), 1);
    assert_eq!(store.replica_count(&DATA, "seller.json"), 1);
}

#[tokio::test]
async fn failed_hydration_returns_to_uninitialized() {
    let store = Arc::new(MemoryObjectStore::new());
    store.require_token("good");
    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "bad"));

    let err = coordinator.hydrate().await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(coordinator.state(), SyncState::Uninitialized);
    assert!(coordinator.stats().last_error.is_some());
    assert_eq!(coordinator.stats().hydrations, 0);

    // The caller chooses to continue locally.
    let local = LocalBackend::new(Arc::new(MemoryStore::new()));
    coordinator.switch_backend(local).await.unwrap();
    assert_eq!(coordinator.state(), SyncState::Ready);
    assert_eq!(coordinator.backend_kind(), BackendKind::Local);
}

#[tokio::test]
async fn network_failure_mid_hydration_keeps_cache() {
    let local_store = Arc::new(MemoryStore::new());
    let local = LocalBackend::new(local_store.clone());
    local
        .write_collection(CollectionName::Customers, &[Record::new("local").unwrap()])
        .await
        .unwrap();

    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), local);
    coordinator.hydrate().await.unwrap();

    let store = Arc::new(MemoryObjectStore::new());
    let mut backend = remote(&store, "t");
    backend.init().await.unwrap();
    store.fail_next_request("connection reset");

    let err = coordinator.switch_backend(backend).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(coordinator.state(), SyncState::Uninitialized);
    assert_eq!(coordinator.collection(CollectionName::Customers).len(), 1);
}

#[tokio::test]
async fn pull_remote_into_local() {
    let store = Arc::new(MemoryObjectStore::new());
    store.seed_file(&DATA, "facturas.json", r#"[{"id":"f1"},{"id":"f2"}]"#);
    store.seed_file(&DATA, "secuencias.json", r#"{"A-2025":{"last":17}}"#);

    let mut coordinator = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    coordinator.hydrate().await.unwrap();
    let invoices = coordinator.collection(CollectionName::Invoices).to_vec();
    let counters = coordinator.counters().clone();

    let local = LocalBackend::new(Arc::new(MemoryStore::new()));
    let mut backup = SyncCoordinator::new(SyncConfig::default(), local.clone());
    backup.hydrate().await.unwrap();
    backup
        .replace_collection(CollectionName::Invoices, invoices)
        .await
        .unwrap();
    backup.replace_counters(counters).await.unwrap();

    let read = local.read_collection(CollectionName::Invoices).await.unwrap();
    assert_eq!(read.items.len(), 2);
    let stored = local.read_counter_map(Default::default()).await.unwrap();
    assert_eq!(stored.last("A-2025"), Some(17));
}

#[tokio::test]
async fn allocation_refresh_avoids_stale_collision() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut tab_a = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    let mut tab_b = SyncCoordinator::new(SyncConfig::default(), remote(&store, "t"));
    tab_a.hydrate().await.unwrap();
    tab_b.hydrate().await.unwrap();

    let a = tab_a.next_number("A", day("2025-05-01")).await.unwrap();
    // Tab B hydrated before A allocated; its cache is stale.
    let b = tab_b.next_number("A", day("2025-05-02")).await.unwrap();

    assert_eq!(a.number, 1);
    assert_eq!(b.number, 2);
    assert_eq!(store.replica_count(&DATA, "secuencias.json"), 1);
}

#[tokio::test]
async fn year_rollover_starts_a_new_key() {
    let local = LocalBackend::new(Arc::new(MemoryStore::new()));
    let mut coordinator = SyncCoordinator::new(SyncConfig::new().with_default_year(2025), local);
    coordinator.hydrate().await.unwrap();

    coordinator.next_number("B", day("2025-12-31")).await.unwrap();
    let next_year = coordinator.next_number("B", day("2026-01-01")).await.unwrap();
    assert_eq!(next_year.key.as_str(), "B-2026");
    assert_eq!(next_year.number, 1);
    assert_eq!(coordinator.counters().last("B-2025"), Some(1));
}

#[tokio::test]
async fn custom_app_folder() {
    let store = Arc::new(MemoryObjectStore::new());
    let config = SyncConfig::new().with_app_folder_name("Acme");
    let backend = RemoteBackend::with_config(
        config.remote_config(),
        store.clone(),
        Arc::new(StaticTokenProvider::new("t")),
    );
    let mut coordinator = SyncCoordinator::new(config, backend);
    coordinator.hydrate().await.unwrap();
    coordinator
        .upsert_record(CollectionName::Customers, Record::new("c1").unwrap())
        .await
        .unwrap();
    assert_eq!(store.replica_count(&["Acme", "data"], "customers.json"), 1);
}
