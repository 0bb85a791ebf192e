use std::sync::Arc;

use super::config::StorageConfig;
use super::error::StorageResult;
use super::object_store::ObjectStoreProvider;
use super::provider::ObjectStoreClient;

/// Factory for creating object store clients
pub struct StorageProviderFactory;

impl StorageProviderFactory {
    /// Create a client bound to `directory` from a configuration.
    ///
    /// Every storage type is served by the object_store backed [`ObjectStoreProvider`].
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The storage configuration is invalid
    /// * Required configuration options are missing
    /// * The storage backend cannot be initialized
    pub async fn from_config(
        config: StorageConfig,
        directory: &str,
    ) -> StorageResult<Arc<dyn ObjectStoreClient>> {
        let provider = ObjectStoreProvider::new(config, directory).await?;
        Ok(Arc::new(provider))
    }
}
