//! Replicated remote backend.
//!
//! Every logical name (`customers.json`, `secuencias.json`, ...) may be
//! backed by several physical files in the data folder. Reads fetch and
//! merge all of them; writes merge the existing replicas with the incoming
//! snapshot and patch only the primary (most recently modified) replica,
//! creating the first one when none exists. Redundant replicas are left in
//! place until an explicit [`RemoteBackend::compact`].

mod client;
mod drive;
mod memory;

pub use client::{FolderRef, ObjectStore, RemoteFile, ROOT_FOLDER};
pub use drive::{DriveClient, DRIVE_API, UPLOAD_API};
pub use memory::MemoryObjectStore;

use crate::auth::{AccessToken, TokenProvider};
use crate::backend::{BackendKind, CollectionRead, StoreBackend};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use docsync_core::{
    merge_counter_maps, merge_records_by_id, overlay_counter_map, CollectionName, CoreError,
    CounterMap, Record, COUNTERS_FILE,
};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Remote folder layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Application folder created under the remote root.
    pub app_folder_name: String,
    /// Data folder created under the application folder.
    pub data_folder_name: String,
}

impl RemoteConfig {
    /// Creates a layout with a custom application folder.
    pub fn new(app_folder_name: impl Into<String>) -> Self {
        Self {
            app_folder_name: app_folder_name.into(),
            ..Self::default()
        }
    }

    /// Sets the data folder name.
    #[must_use]
    pub fn with_data_folder_name(mut self, name: impl Into<String>) -> Self {
        self.data_folder_name = name.into();
        self
    }

    /// Folder path from the remote root to the data folder.
    pub fn data_path(&self) -> [&str; 2] {
        [&self.app_folder_name, &self.data_folder_name]
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            app_folder_name: "FSClone".into(),
            data_folder_name: "data".into(),
        }
    }
}

/// Resolved folder handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSet {
    /// Application folder.
    pub app: FolderRef,
    /// Data folder holding every replica.
    pub data: FolderRef,
}

/// Token plus folder handles, created by [`RemoteBackend::connect`].
///
/// Owned by one backend instance and never persisted.
#[derive(Debug, Clone)]
pub struct StorageSession {
    token: AccessToken,
    folders: FolderSet,
}

impl StorageSession {
    /// Returns the bearer token.
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Returns the resolved folders.
    pub fn folders(&self) -> &FolderSet {
        &self.folders
    }
}

/// What [`RemoteBackend::compact`] operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactTarget {
    /// A record collection.
    Collection(CollectionName),
    /// The numbering table.
    Counters,
}

impl CompactTarget {
    /// Storage name of the target.
    pub const fn file_name(&self) -> &'static str {
        match self {
            CompactTarget::Collection(name) => name.file_name(),
            CompactTarget::Counters => COUNTERS_FILE,
        }
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactTarget::Collection(name) => write!(f, "{name}"),
            CompactTarget::Counters => f.write_str("counters"),
        }
    }
}

impl FromStr for CompactTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "counters" || s == COUNTERS_FILE {
            return Ok(CompactTarget::Counters);
        }
        s.parse().map(CompactTarget::Collection)
    }
}

/// Outcome of a compaction or its dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionReport {
    /// Storage name.
    pub name: String,
    /// Replica that holds (or would hold) the merged content.
    pub primary: Option<String>,
    /// Replicas moved (or that would be moved) to the trash.
    pub trashed: Vec<String>,
    /// Redundant replicas left in place because their content could not be
    /// merged.
    pub skipped: Vec<String>,
    /// Number of records or counter keys in the merged content.
    pub entries: usize,
    /// True if nothing was changed.
    pub dry_run: bool,
}

/// A fetched replica with its parsed content.
struct Replica {
    file: RemoteFile,
    content: Option<Value>,
}

impl Replica {
    /// Records of an array replica. Anything else counts as empty.
    fn records(&self, name: &str) -> Vec<Record> {
        match &self.content {
            Some(Value::Array(values)) => values
                .iter()
                .cloned()
                .filter_map(Record::from_value)
                .collect(),
            Some(_) => {
                contained(
                    name,
                    StorageError::Parse {
                        replica: self.file.id.clone(),
                        reason: "expected a JSON array".into(),
                    },
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Returns true if the content has the shape `target` stores.
    fn fits(&self, target: CompactTarget) -> bool {
        match (target, &self.content) {
            (CompactTarget::Collection(_), Some(Value::Array(_))) => true,
            (CompactTarget::Counters, Some(content)) => CounterMap::from_value(content).is_some(),
            _ => false,
        }
    }

    /// Counter map of an object replica. Anything else counts as empty.
    fn counters(&self, name: &str) -> CounterMap {
        let Some(content) = &self.content else {
            return CounterMap::new();
        };
        CounterMap::from_value(content).unwrap_or_else(|| {
            contained(
                name,
                StorageError::Parse {
                    replica: self.file.id.clone(),
                    reason: "expected a counter object".into(),
                },
            );
            CounterMap::new()
        })
    }
}

/// Logs a replica-level error that must not abort the merge.
fn contained(name: &str, error: StorageError) {
    warn!(name, error = %error, "skipping malformed replica");
}

/// Remote backend over an [`ObjectStore`].
#[derive(Clone)]
pub struct RemoteBackend {
    config: RemoteConfig,
    client: Arc<dyn ObjectStore>,
    tokens: Arc<dyn TokenProvider>,
    session: Option<StorageSession>,
}

impl RemoteBackend {
    /// Creates a backend with the default folder layout.
    pub fn new(client: Arc<dyn ObjectStore>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_config(RemoteConfig::default(), client, tokens)
    }

    /// Creates a backend with a custom folder layout.
    pub fn with_config(
        config: RemoteConfig,
        client: Arc<dyn ObjectStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            config,
            client,
            tokens,
            session: None,
        }
    }

    /// Returns the folder layout.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Returns true once [`connect`](Self::connect) has succeeded.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the active session, if connected.
    pub fn session(&self) -> Option<&StorageSession> {
        self.session.as_ref()
    }

    /// Acquires a token and resolves the folder hierarchy, creating
    /// missing folders.
    ///
    /// Two sessions connecting at the same time may both create a folder;
    /// later lookups use the first match.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Auth`] if no token can be acquired, or any
    /// request error from the object store.
    pub async fn connect(&mut self) -> StorageResult<&StorageSession> {
        let token = self.tokens.acquire().await?;
        let app = self
            .find_or_create_folder(&token, ROOT_FOLDER, &self.config.app_folder_name)
            .await?;
        let data = self
            .find_or_create_folder(&token, &app.id, &self.config.data_folder_name)
            .await?;
        info!(app = %app.id, data = %data.id, "connected to remote store");

        let session = self.session.insert(StorageSession {
            token,
            folders: FolderSet { app, data },
        });
        Ok(&*session)
    }

    async fn find_or_create_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<FolderRef> {
        if let Some(folder) = self.client.find_folder(token, parent, name).await? {
            return Ok(folder);
        }
        let folder = self.client.create_folder(token, parent, name).await?;
        info!(parent, name, id = %folder.id, "created remote folder");
        Ok(folder)
    }

    fn active(&self) -> StorageResult<&StorageSession> {
        self.session.as_ref().ok_or(StorageError::NotConnected)
    }

    /// Lists the replicas of `name`, most recently modified first.
    ///
    /// Replicas with equal modification times keep the remote order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotConnected`] before `connect`, or the
    /// request error.
    pub async fn list_replicas(&self, name: &str) -> StorageResult<Vec<RemoteFile>> {
        let session = self.active()?;
        let mut files = self
            .client
            .list_files(&session.token, &session.folders.data.id, name)
            .await?;
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(files)
    }

    /// Fetches every replica of `name`, most recently modified first.
    async fn fetch_replicas(&self, name: &str) -> StorageResult<Vec<Replica>> {
        let session = self.active()?;
        let files = self.list_replicas(name).await?;
        let mut replicas = Vec::with_capacity(files.len());
        for file in files {
            let bytes = self.client.fetch_content(&session.token, &file.id).await?;
            let content = match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    contained(
                        name,
                        StorageError::Parse {
                            replica: file.id.clone(),
                            reason: e.to_string(),
                        },
                    );
                    None
                }
            };
            debug!(name, replica = %file.id, bytes = bytes.len(), "fetched replica");
            replicas.push(Replica { file, content });
        }
        if replicas.len() > 1 {
            warn!(name, replicas = replicas.len(), "duplicate replicas");
        }
        Ok(replicas)
    }

    /// Writes `content` to the primary replica, or creates the first one.
    async fn store(
        &self,
        name: &str,
        primary: Option<&RemoteFile>,
        content: &Value,
    ) -> StorageResult<()> {
        let session = self.active()?;
        let bytes = serde_json::to_vec(content)?;
        match primary {
            Some(file) => {
                self.client
                    .patch_content(&session.token, &file.id, bytes)
                    .await?;
                debug!(name, replica = %file.id, "patched primary replica");
            }
            None => {
                let id = self
                    .client
                    .create_file(&session.token, &session.folders.data.id, name, bytes)
                    .await?;
                info!(name, replica = %id, "created first replica");
            }
        }
        Ok(())
    }

    /// Merges every replica of a collection, oldest first.
    fn merge_collection(name: CollectionName, replicas: &[Replica]) -> Vec<Record> {
        merge_records_by_id(
            replicas
                .iter()
                .rev()
                .map(|replica| replica.records(name.file_name())),
        )
    }

    fn merge_counters(replicas: &[Replica]) -> CounterMap {
        let maps: Vec<CounterMap> = replicas
            .iter()
            .map(|replica| replica.counters(COUNTERS_FILE))
            .collect();
        merge_counter_maps(&maps)
    }

    /// Reports what [`compact`](Self::compact) would do, changing nothing.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn plan_compaction(&self, target: CompactTarget) -> StorageResult<CompactionReport> {
        let replicas = self.fetch_replicas(target.file_name()).await?;
        let (_, report) = Self::compaction(target, &replicas, true)?;
        Ok(report)
    }

    /// Merges every replica of `target` into the primary, then moves the
    /// other replicas to the trash.
    ///
    /// A write from another session that lands between the merge and the
    /// trash calls can be lost if it patched a replica that is then
    /// trashed. Only run this while no other session is writing.
    ///
    /// # Errors
    ///
    /// Returns any request error. If trashing fails part way, the primary
    /// already holds the merged content and the remaining replicas are
    /// left in place.
    pub async fn compact(&self, target: CompactTarget) -> StorageResult<CompactionReport> {
        let name = target.file_name();
        let replicas = self.fetch_replicas(name).await?;
        let (merged, report) = Self::compaction(target, &replicas, false)?;
        if report.trashed.is_empty() {
            return Ok(report);
        }

        let session = self.active()?;
        self.store(name, replicas.first().map(|r| &r.file), &merged)
            .await?;
        for id in &report.trashed {
            self.client.trash_file(&session.token, id).await?;
            debug!(name, replica = %id, "trashed redundant replica");
        }
        info!(name, trashed = report.trashed.len(), "compacted replicas");
        Ok(report)
    }

    fn compaction(
        target: CompactTarget,
        replicas: &[Replica],
        dry_run: bool,
    ) -> StorageResult<(Value, CompactionReport)> {
        let (merged, entries) = match target {
            CompactTarget::Collection(name) => {
                let records = Self::merge_collection(name, replicas);
                (serde_json::to_value(&records)?, records.len())
            }
            CompactTarget::Counters => {
                let counters = Self::merge_counters(replicas);
                (serde_json::to_value(&counters)?, counters.len())
            }
        };
        let (mergeable, unmerged): (Vec<&Replica>, Vec<&Replica>) =
            replicas.iter().skip(1).partition(|r| r.fits(target));
        if !unmerged.is_empty() {
            warn!(
                name = target.file_name(),
                skipped = unmerged.len(),
                "leaving malformed replicas in place"
            );
        }
        let report = CompactionReport {
            name: target.file_name().to_owned(),
            primary: replicas.first().map(|r| r.file.id.clone()),
            trashed: mergeable.iter().map(|r| r.file.id.clone()).collect(),
            skipped: unmerged.iter().map(|r| r.file.id.clone()).collect(),
            entries,
            dry_run,
        };
        Ok((merged, report))
    }
}

impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl StoreBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn init(&mut self) -> StorageResult<()> {
        if self.session.is_none() {
            self.connect().await?;
        }
        Ok(())
    }

    async fn read_one(&self, name: &str, fallback: Value) -> StorageResult<Value> {
        let replicas = self.fetch_replicas(name).await?;
        Ok(replicas
            .into_iter()
            .find_map(|replica| replica.content)
            .unwrap_or(fallback))
    }

    async fn write_one(&self, name: &str, value: &Value) -> StorageResult<()> {
        let replicas = self.list_replicas(name).await?;
        self.store(name, replicas.first(), value).await
    }

    async fn read_collection(&self, name: CollectionName) -> StorageResult<CollectionRead> {
        let replicas = self.fetch_replicas(name.file_name()).await?;
        Ok(CollectionRead {
            items: Self::merge_collection(name, &replicas),
            replica_count: replicas.len(),
        })
    }

    async fn write_collection(&self, name: CollectionName, items: &[Record]) -> StorageResult<()> {
        let replicas = self.fetch_replicas(name.file_name()).await?;
        let existing = Self::merge_collection(name, &replicas);
        let merged = merge_records_by_id([existing, items.to_vec()]);
        debug!(collection = %name, records = merged.len(), replicas = replicas.len(), "merge-on-write");

        let content = serde_json::to_value(&merged)?;
        self.store(name.file_name(), replicas.first().map(|r| &r.file), &content)
            .await
    }

    async fn read_counter_map(&self, fallback: CounterMap) -> StorageResult<CounterMap> {
        let replicas = self.fetch_replicas(COUNTERS_FILE).await?;
        let merged = Self::merge_counters(&replicas);
        Ok(if merged.is_empty() { fallback } else { merged })
    }

    async fn write_counter_map(&self, counters: &CounterMap) -> StorageResult<()> {
        let replicas = self.fetch_replicas(COUNTERS_FILE).await?;
        let base = Self::merge_counters(&replicas);
        let merged = overlay_counter_map(&base, counters);

        let content = serde_json::to_value(&merged)?;
        self.store(COUNTERS_FILE, replicas.first().map(|r| &r.file), &content)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use serde_json::json;

    const DATA: [&str; 2] = ["FSClone", "data"];

    fn backend(store: &Arc<MemoryObjectStore>) -> RemoteBackend {
        RemoteBackend::new(store.clone(), Arc::new(StaticTokenProvider::new("t")))
    }

    #[tokio::test]
    async fn operations_before_connect_fail() {
        let store = Arc::new(MemoryObjectStore::new());
        let backend = backend(&store);
        let err = backend.list_replicas("customers.json").await.unwrap_err();
        assert!(matches!(err, StorageError::NotConnected));
    }

    #[tokio::test]
    async fn connect_creates_folders_once() {
        let store = Arc::new(MemoryObjectStore::new());
        let mut first = backend(&store);
        first.connect().await.unwrap();
        let mut second = backend(&store);
        second.connect().await.unwrap();

        assert_eq!(store.folder_count(ROOT_FOLDER, "FSClone"), 1);
        assert_eq!(
            first.session().unwrap().folders(),
            second.session().unwrap().folders()
        );
        assert_eq!(store.folder_id(&DATA), Some(first.session().unwrap().folders().data.id.clone()));
    }

    #[tokio::test]
    async fn connect_reuses_seeded_folders() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "customers.json", "[]");
        let mut backend = backend(&store);
        backend.connect().await.unwrap();
        assert_eq!(backend.list_replicas("customers.json").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn custom_layout() {
        let store = Arc::new(MemoryObjectStore::new());
        let config = RemoteConfig::new("Other").with_data_folder_name("docs");
        let mut backend = RemoteBackend::with_config(
            config,
            store.clone(),
            Arc::new(StaticTokenProvider::new("t")),
        );
        backend.init().await.unwrap();
        assert!(store.folder_id(&["Other", "docs"]).is_some());
    }

    #[tokio::test]
    async fn replicas_listed_newest_first() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "facturas.json", "[1]");
        store.seed_file(&DATA, "facturas.json", "[2]");
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let files = backend.list_replicas("facturas.json").await.unwrap();
        assert!(files[0].modified_time > files[1].modified_time);
    }

    #[tokio::test]
    async fn newest_replica_wins_on_collision() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "customers.json", r#"[{"id":"c1","name":"old"}]"#);
        store.seed_file(&DATA, "customers.json", r#"[{"id":"c1","name":"new"}]"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let read = backend.read_collection(CollectionName::Customers).await.unwrap();
        assert_eq!(read.items.len(), 1);
        assert_eq!(read.items[0].get("name"), Some(&json!("new")));
        assert_eq!(read.dup_count(), 1);
    }

    #[tokio::test]
    async fn non_array_replica_counts_as_empty() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "products.json", r#"{"id":"p0"}"#);
        store.seed_file(&DATA, "products.json", r#"[{"id":"p1"}]"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let read = backend.read_collection(CollectionName::Products).await.unwrap();
        assert_eq!(read.items, vec![Record::new("p1").unwrap()]);
        assert_eq!(read.replica_count, 2);
    }

    #[tokio::test]
    async fn read_one_prefers_newest_parsable() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "seller.json", r#"{"name":"A"}"#);
        store.seed_file(&DATA, "seller.json", "not json");
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let value = backend.read_one("seller.json", json!(null)).await.unwrap();
        assert_eq!(value, json!({"name": "A"}));
        let value = backend.read_one("missing.json", json!({})).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn write_one_patches_primary() {
        let store = Arc::new(MemoryObjectStore::new());
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        backend.write_one("seller.json", &json!({"name": "A"})).await.unwrap();
        backend.write_one("seller.json", &json!({"name": "B"})).await.unwrap();
        assert_eq!(store.replica_count(&DATA, "seller.json"), 1);
        assert_eq!(
            backend.read_one("seller.json", json!(null)).await.unwrap(),
            json!({"name": "B"})
        );
    }

    #[tokio::test]
    async fn counter_fallback_when_no_replicas() {
        let store = Arc::new(MemoryObjectStore::new());
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let counters = backend.read_counter_map(CounterMap::initial(2025)).await.unwrap();
        assert_eq!(counters, CounterMap::initial(2025));
    }

    #[tokio::test]
    async fn counter_write_preserves_absent_keys() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, COUNTERS_FILE, r#"{"A-2025":{"last":9},"B-2025":{"last":4}}"#);
        store.seed_file(&DATA, COUNTERS_FILE, r#"{"A-2025":{"last":7}}"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let mut incoming = CounterMap::new();
        incoming.set("A-2025", 10);
        backend.write_counter_map(&incoming).await.unwrap();

        let counters = backend.read_counter_map(CounterMap::new()).await.unwrap();
        assert_eq!(counters.last("A-2025"), Some(10));
        assert_eq!(counters.last("B-2025"), Some(4));
        assert_eq!(store.replica_count(&DATA, COUNTERS_FILE), 2);
    }

    #[tokio::test]
    async fn compaction_plan_changes_nothing() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a1"}]"#);
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a2"}]"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let target = CompactTarget::Collection(CollectionName::DeliveryNotes);
        let plan = backend.plan_compaction(target).await.unwrap();
        assert!(plan.dry_run);
        assert_eq!(plan.trashed.len(), 1);
        assert_eq!(plan.entries, 2);
        assert_eq!(store.replica_count(&DATA, "albaranes.json"), 2);
    }

    #[tokio::test]
    async fn compaction_keeps_every_record() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a1"}]"#);
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a2"}]"#);
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a3"}]"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let target = CompactTarget::Collection(CollectionName::DeliveryNotes);
        let report = backend.compact(target).await.unwrap();
        assert_eq!(report.trashed.len(), 2);
        assert_eq!(store.replica_count(&DATA, "albaranes.json"), 1);

        let read = backend.read_collection(CollectionName::DeliveryNotes).await.unwrap();
        assert_eq!(read.items.len(), 3);
        assert_eq!(read.dup_count(), 0);
    }

    #[tokio::test]
    async fn compaction_leaves_malformed_replicas_in_place() {
        let store = Arc::new(MemoryObjectStore::new());
        let broken = store.seed_file(&DATA, "albaranes.json", "{not json");
        let wrong_shape = store.seed_file(&DATA, "albaranes.json", r#"{"id":"a0"}"#);
        let good = store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a1"}]"#);
        store.seed_file(&DATA, "albaranes.json", r#"[{"id":"a2"}]"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let target = CompactTarget::Collection(CollectionName::DeliveryNotes);
        let report = backend.compact(target).await.unwrap();
        assert_eq!(report.trashed, vec![good]);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.contains(&broken));
        assert!(report.skipped.contains(&wrong_shape));

        let left = store.contents(&DATA, "albaranes.json");
        assert_eq!(left.len(), 3);
        assert!(left.contains(&b"{not json".to_vec()));
    }

    #[tokio::test]
    async fn compacting_a_single_replica_is_a_no_op() {
        let store = Arc::new(MemoryObjectStore::new());
        store.seed_file(&DATA, COUNTERS_FILE, r#"{"A-2025":{"last":1}}"#);
        let mut backend = backend(&store);
        backend.connect().await.unwrap();

        let writes = store.write_count();
        let report = backend.compact(CompactTarget::Counters).await.unwrap();
        assert!(report.trashed.is_empty());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn compact_target_parsing() {
        assert_eq!("counters".parse::<CompactTarget>().unwrap(), CompactTarget::Counters);
        assert_eq!(
            "secuencias.json".parse::<CompactTarget>().unwrap(),
            CompactTarget::Counters
        );
        assert_eq!(
            "invoices".parse::<CompactTarget>().unwrap(),
            CompactTarget::Collection(CollectionName::Invoices)
        );
        assert!("nope".parse::<CompactTarget>().is_err());
        assert_eq!(CompactTarget::Counters.file_name(), "secuencias.json");
    }
}
