//! Object-store client abstraction.
//!
//! One method per remote call the backend makes. [`super::DriveClient`]
//! talks to the Drive v3 REST API; [`super::MemoryObjectStore`] keeps
//! everything in process for tests.

use crate::auth::AccessToken;
use crate::error::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Parent id of the remote root folder.
pub const ROOT_FOLDER: &str = "root";

/// A folder handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    /// Remote id.
    pub id: String,
    /// Folder name.
    #[serde(default)]
    pub name: String,
}

/// One physical remote file.
///
/// Several files may share a name; each is a replica of that logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Remote id (the replica handle).
    pub id: String,
    /// File name.
    pub name: String,
    /// Last modification time.
    pub modified_time: DateTime<Utc>,
    /// Content size in bytes, when reported.
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
}

/// Drive reports sizes as decimal strings; accept numbers too.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Size>::deserialize(deserializer)? {
        Some(Size::Number(n)) => Some(n),
        Some(Size::Text(s)) => s.parse().ok(),
        None => None,
    })
}

/// The remote object-store API consumed by [`super::RemoteBackend`].
///
/// Implementations must not retry; failures are returned as
/// [`crate::StorageError::Network`] or [`crate::StorageError::Auth`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Finds a non-trashed folder called `name` under `parent`.
    async fn find_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Option<FolderRef>>;

    /// Creates a folder called `name` under `parent`.
    async fn create_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<FolderRef>;

    /// Lists non-trashed files called `name` under `parent`, in remote order.
    async fn list_files(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Vec<RemoteFile>>;

    /// Creates a JSON file and uploads its content. Returns the new id.
    async fn create_file(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
        content: Vec<u8>,
    ) -> StorageResult<String>;

    /// Fetches a file's content.
    async fn fetch_content(&self, token: &AccessToken, id: &str) -> StorageResult<Vec<u8>>;

    /// Replaces a file's content.
    async fn patch_content(&self, token: &AccessToken, id: &str, content: Vec<u8>)
        -> StorageResult<()>;

    /// Moves a file to the trash.
    async fn trash_file(&self, token: &AccessToken, id: &str) -> StorageResult<()>;
}
