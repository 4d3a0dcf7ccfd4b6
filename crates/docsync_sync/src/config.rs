//! Configuration for the sync coordinator.

use docsync_storage::{LocalBackend, LocalStore, RemoteConfig, DEFAULT_NAMESPACE};
use std::sync::Arc;

/// Configuration for the sync coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote application folder name.
    pub app_folder_name: String,
    /// Year used for the default numbering table when none is stored.
    pub default_year: i32,
    /// Key under which the local backend keeps everything.
    pub local_namespace: String,
}

impl SyncConfig {
    /// Creates a configuration with the deployment defaults.
    pub fn new() -> Self {
        Self {
            app_folder_name: "FSClone".into(),
            default_year: 2025,
            local_namespace: DEFAULT_NAMESPACE.into(),
        }
    }

    /// Sets the remote application folder name.
    pub fn with_app_folder_name(mut self, name: impl Into<String>) -> Self {
        self.app_folder_name = name.into();
        self
    }

    /// Sets the default numbering year.
    pub fn with_default_year(mut self, year: i32) -> Self {
        self.default_year = year;
        self
    }

    /// Sets the local namespace key.
    pub fn with_local_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.local_namespace = namespace.into();
        self
    }

    /// Remote folder layout for this configuration.
    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig::new(self.app_folder_name.clone())
    }

    /// Local backend over `store` using the configured namespace.
    pub fn local_backend(&self, store: Arc<dyn LocalStore>) -> LocalBackend {
        LocalBackend::with_namespace(store, self.local_namespace.clone())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_storage::MemoryStore;

    #[test]
    fn defaults_match_deployment() {
        let config = SyncConfig::default();
        assert_eq!(config.app_folder_name, "FSClone");
        assert_eq!(config.default_year, 2025);
        assert_eq!(config.local_namespace, "fsclone-cloud-v6");
    }

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new()
            .with_app_folder_name("Acme")
            .with_default_year(2026)
            .with_local_namespace("acme-v1");

        assert_eq!(config.remote_config().app_folder_name, "Acme");
        assert_eq!(config.remote_config().data_folder_name, "data");
        assert_eq!(config.default_year, 2026);

        let backend = config.local_backend(Arc::new(MemoryStore::new()));
        assert_eq!(backend.namespace(), "acme-v1");
    }
}
