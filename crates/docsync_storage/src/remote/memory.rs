//! In-memory object store for testing.

use super::client::{FolderRef, ObjectStore, RemoteFile, ROOT_FOLDER};
use crate::auth::AccessToken;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredObject {
    name: String,
    parent: String,
    folder: bool,
    trashed: bool,
    content: Vec<u8>,
    modified_time: DateTime<Utc>,
    created_seq: u64,
}

#[derive(Debug)]
struct MemoryState {
    objects: BTreeMap<String, StoredObject>,
    clock: DateTime<Utc>,
    next_seq: u64,
    fail_next: Option<String>,
    accepted_token: Option<String>,
    writes: usize,
}

impl MemoryState {
    /// Advances the clock; every mutation gets a strictly later timestamp.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += Duration::seconds(1);
        self.clock
    }

    fn insert(&mut self, parent: &str, name: &str, folder: bool, content: Vec<u8>) -> String {
        let id = Uuid::new_v4().to_string();
        let modified_time = self.tick();
        let created_seq = self.next_seq;
        self.next_seq += 1;
        self.objects.insert(
            id.clone(),
            StoredObject {
                name: name.to_owned(),
                parent: parent.to_owned(),
                folder,
                trashed: false,
                content,
                modified_time,
                created_seq,
            },
        );
        id
    }

    fn live(&self, parent: &str, name: &str, folder: bool) -> Vec<(&String, &StoredObject)> {
        let mut found: Vec<_> = self
            .objects
            .iter()
            .filter(|(_, o)| {
                !o.trashed && o.folder == folder && o.parent == parent && o.name == name
            })
            .collect();
        found.sort_by_key(|(_, o)| o.created_seq);
        found
    }

    fn folder_path(&self, path: &[&str]) -> Option<String> {
        let mut parent = ROOT_FOLDER.to_owned();
        for segment in path {
            let (id, _) = self.live(&parent, segment, true).into_iter().next()?;
            parent = id.clone();
        }
        Some(parent)
    }

    fn ensure_folder_path(&mut self, path: &[&str]) -> String {
        let mut parent = ROOT_FOLDER.to_owned();
        for segment in path {
            let existing = self
                .live(&parent, segment, true)
                .into_iter()
                .next()
                .map(|(id, _)| id.clone());
            parent = match existing {
                Some(id) => id,
                None => self.insert(&parent, segment, true, Vec::new()),
            };
        }
        parent
    }

    fn check(&mut self, token: &AccessToken) -> StorageResult<()> {
        if let Some(message) = self.fail_next.take() {
            return Err(StorageError::network(message));
        }
        match &self.accepted_token {
            Some(accepted) if accepted != token.secret() => {
                Err(StorageError::Auth("token rejected".into()))
            }
            _ => Ok(()),
        }
    }

    fn file_mut(&mut self, id: &str) -> StorageResult<&mut StoredObject> {
        self.objects
            .get_mut(id)
            .filter(|o| !o.folder)
            .ok_or_else(|| StorageError::http_status(404, format!("file not found: {id}")))
    }
}

/// An in-memory object store.
///
/// Behaves like the remote API the backend consumes: names are not
/// unique, files can be trashed, and every mutation advances a logical
/// clock by one second so modification times are strictly ordered.
///
/// Share it through `Arc` between several backends to simulate
/// independent sessions writing to the same folder tree.
#[derive(Debug)]
pub struct MemoryObjectStore {
    state: RwLock<MemoryState>,
}

impl MemoryObjectStore {
    /// Creates an empty store. The logical clock starts at 2025-01-01.
    pub fn new() -> Self {
        let clock = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            state: RwLock::new(MemoryState {
                objects: BTreeMap::new(),
                clock,
                next_seq: 0,
                fail_next: None,
                accepted_token: None,
                writes: 0,
            }),
        }
    }

    /// Rejects every token except `token` with [`StorageError::Auth`].
    pub fn require_token(&self, token: impl Into<String>) {
        self.state.write().accepted_token = Some(token.into());
    }

    /// Makes the next request fail with a network error.
    pub fn fail_next_request(&self, message: impl Into<String>) {
        self.state.write().fail_next = Some(message.into());
    }

    /// Creates a file with raw content under the folder path, creating
    /// missing folders. Returns the file id.
    pub fn seed_file(
        &self,
        folder_path: &[&str],
        name: &str,
        content: impl Into<Vec<u8>>,
    ) -> String {
        let mut state = self.state.write();
        let parent = state.ensure_folder_path(folder_path);
        state.insert(&parent, name, false, content.into())
    }

    /// Returns the id of the folder at `path`, if it exists.
    pub fn folder_id(&self, path: &[&str]) -> Option<String> {
        self.state.read().folder_path(path)
    }

    /// Number of live folders called `name` under `parent`.
    pub fn folder_count(&self, parent: &str, name: &str) -> usize {
        self.state.read().live(parent, name, true).len()
    }

    /// Raw contents of the live files called `name` under the folder path,
    /// most recently modified first.
    pub fn contents(&self, folder_path: &[&str], name: &str) -> Vec<Vec<u8>> {
        let state = self.state.read();
        let Some(parent) = state.folder_path(folder_path) else {
            return Vec::new();
        };
        let mut files: Vec<_> = state.live(&parent, name, false);
        files.sort_by(|a, b| b.1.modified_time.cmp(&a.1.modified_time));
        files.into_iter().map(|(_, o)| o.content.clone()).collect()
    }

    /// Number of live files called `name` under the folder path.
    pub fn replica_count(&self, folder_path: &[&str], name: &str) -> usize {
        self.contents(folder_path, name).len()
    }

    /// Number of content writes (creates and patches) served so far.
    pub fn write_count(&self) -> usize {
        self.state.read().writes
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn find_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Option<FolderRef>> {
        let mut state = self.state.write();
        state.check(token)?;
        Ok(state
            .live(parent, name, true)
            .into_iter()
            .next()
            .map(|(id, o)| FolderRef {
                id: id.clone(),
                name: o.name.clone(),
            }))
    }

    async fn create_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<FolderRef> {
        let mut state = self.state.write();
        state.check(token)?;
        let id = state.insert(parent, name, true, Vec::new());
        Ok(FolderRef {
            id,
            name: name.to_owned(),
        })
    }

    async fn list_files(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Vec<RemoteFile>> {
        let mut state = self.state.write();
        state.check(token)?;
        Ok(state
            .live(parent, name, false)
            .into_iter()
            .map(|(id, o)| RemoteFile {
                id: id.clone(),
                name: o.name.clone(),
                modified_time: o.modified_time,
                size: Some(o.content.len() as u64),
            })
            .collect())
    }

    async fn create_file(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
        content: Vec<u8>,
    ) -> StorageResult<String> {
        let mut state = self.state.write();
        state.check(token)?;
        state.writes += 1;
        Ok(state.insert(parent, name, false, content))
    }

    async fn fetch_content(&self, token: &AccessToken, id: &str) -> StorageResult<Vec<u8>> {
        let mut state = self.state.write();
        state.check(token)?;
        Ok(state.file_mut(id)?.content.clone())
    }

    async fn patch_content(
        &self,
        token: &AccessToken,
        id: &str,
        content: Vec<u8>,
    ) -> StorageResult<()> {
        let mut state = self.state.write();
        state.check(token)?;
        let now = state.tick();
        let file = state.file_mut(id)?;
        file.content = content;
        file.modified_time = now;
        state.writes += 1;
        Ok(())
    }

    async fn trash_file(&self, token: &AccessToken, id: &str) -> StorageResult<()> {
        let mut state = self.state.write();
        state.check(token)?;
        let now = state.tick();
        let file = state.file_mut(id)?;
        file.trashed = true;
        file.modified_time = now;
        Ok(())
    }
}
