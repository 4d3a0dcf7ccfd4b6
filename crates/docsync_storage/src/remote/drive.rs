//! Google Drive v3 object-store client.
//!
//! Request shapes match what existing deployments send, so folders and
//! files written by earlier clients are found and updated in place.

use super::client::{FolderRef, ObjectStore, RemoteFile};
use crate::auth::AccessToken;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Drive metadata API base.
pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
/// Drive media upload base.
pub const UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/files";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const JSON_MIME: &str = "application/json";
const FILE_FIELDS: &str = "files(id,name,modifiedTime,size)";
const FOLDER_FIELDS: &str = "files(id,name,modifiedTime)";

#[derive(Debug, Deserialize)]
struct FileList<T> {
    #[serde(default = "Vec::new")]
    files: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive v3 client.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    /// Creates a client for the public Drive endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(DRIVE_API, UPLOAD_API)
    }

    /// Creates a client for custom endpoints (proxies, test servers).
    pub fn with_endpoints(api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }

    /// Returns the metadata API base.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> StorageResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::network(format!("{what}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::Auth(format!("{what}: {status}")));
        }
        if !status.is_success() {
            return Err(StorageError::http_status(
                status.as_u16(),
                format!("{what}: {status}"),
            ));
        }
        Ok(response)
    }

    async fn list<T: for<'de> Deserialize<'de>>(
        &self,
        token: &AccessToken,
        query: String,
        fields: &str,
    ) -> StorageResult<Vec<T>> {
        let request = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .query(&[("q", query.as_str()), ("fields", fields)]);

        let response = self.send(request, "list files").await?;
        let list: FileList<T> = response
            .json()
            .await
            .map_err(|e| StorageError::Protocol(format!("invalid file list: {e}")))?;
        Ok(list.files)
    }

    async fn upload(&self, token: &AccessToken, id: &str, content: Vec<u8>) -> StorageResult<()> {
        let request = self
            .http
            .patch(format!("{}/{id}", self.upload_base))
            .bearer_auth(token.secret())
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, JSON_MIME)
            .body(content);
        self.send(request, "upload content").await?;
        Ok(())
    }
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes a value for a single-quoted Drive query literal.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn file_query(parent: &str, name: &str) -> String {
    format!(
        "'{}' in parents and name='{}' and trashed=false",
        quote(parent),
        quote(name)
    )
}

fn folder_query(parent: &str, name: &str) -> String {
    format!(
        "mimeType='{FOLDER_MIME}' and name='{}' and '{}' in parents and trashed=false",
        quote(name),
        quote(parent)
    )
}

#[async_trait]
impl ObjectStore for DriveClient {
    async fn find_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Option<FolderRef>> {
        let folders: Vec<FolderRef> = self
            .list(token, folder_query(parent, name), FOLDER_FIELDS)
            .await?;
        Ok(folders.into_iter().next())
    }

    async fn create_folder(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<FolderRef> {
        let request = self
            .http
            .post(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent],
            }));
        let response = self.send(request, "create folder").await?;
        debug!(parent, name, "created remote folder");
        response
            .json()
            .await
            .map_err(|e| StorageError::Protocol(format!("invalid folder response: {e}")))
    }

    async fn list_files(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
    ) -> StorageResult<Vec<RemoteFile>> {
        self.list(token, file_query(parent, name), FILE_FIELDS).await
    }

    async fn create_file(
        &self,
        token: &AccessToken,
        parent: &str,
        name: &str,
        content: Vec<u8>,
    ) -> StorageResult<String> {
        let request = self
            .http
            .post(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .query(&[("fields", "id")])
            .json(&json!({
                "name": name,
                "parents": [parent],
                "mimeType": JSON_MIME,
            }));
        let response = self.send(request, "create file").await?;
        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| StorageError::Protocol(format!("invalid create response: {e}")))?;

        self.upload(token, &created.id, content).await?;
        debug!(name, id = %created.id, "created remote file");
        Ok(created.id)
    }

    async fn fetch_content(&self, token: &AccessToken, id: &str) -> StorageResult<Vec<u8>> {
        let request = self
            .http
            .get(format!("{}/files/{id}", self.api_base))
            .bearer_auth(token.secret())
            .query(&[("alt", "media")]);
        let response = self.send(request, "fetch content").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::network(format!("read content: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn patch_content(
        &self,
        token: &AccessToken,
        id: &str,
        content: Vec<u8>,
    ) -> StorageResult<()> {
        self.upload(token, id, content).await
    }

    async fn trash_file(&self, token: &AccessToken, id: &str) -> StorageResult<()> {
        let request = self
            .http
            .patch(format!("{}/files/{id}", self.api_base))
            .bearer_auth(token.secret())
            .json(&json!({ "trashed": true }));
        self.send(request, "trash file").await?;
        Ok(())
    }
}
