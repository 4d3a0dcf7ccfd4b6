//! CLI command implementations.

pub mod inspect;
pub mod next_number;
pub mod remote;

use crate::config::Settings;
use docsync_storage::{
    DriveClient, FileStore, LocalBackend, RemoteBackend, StaticTokenProvider,
};
use std::sync::Arc;

/// Result type shared by the commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Opens the local store in the configured data directory.
pub fn open_local(settings: &Settings) -> Result<LocalBackend, Box<dyn std::error::Error>> {
    let store = FileStore::open(&settings.data_dir)?;
    Ok(settings.sync.local_backend(Arc::new(store)))
}

/// Builds an unconnected Drive backend using the configured token variable.
pub fn remote_backend(settings: &Settings) -> RemoteBackend {
    RemoteBackend::with_config(
        settings.sync.remote_config(),
        Arc::new(DriveClient::new()),
        Arc::new(StaticTokenProvider::from_env(&settings.token_env)),
    )
}
