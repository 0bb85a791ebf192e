// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::sync::Arc;
use tracing::debug;

use super::bucket::Bucket;
use super::config::{Provider, StorageConfig};
use super::error::StorageResult;
use super::factory::StorageProviderFactory;
use super::provider::ObjectStoreClient;
use super::remote_file::RemoteFile;
use super::sweeper::{CacheSweeper, SweepReport};
use super::url::{ProviderUrls, UrlGenerator};
use crate::uploader::{CacheId, SourceFile, UploaderConfig};
use crate::util::{Clock, SystemClock};

/// Builder for constructing a `StorageAdapter` instance.
pub struct StorageAdapterBuilder {
    config: StorageConfig,
    uploader: UploaderConfig,
    clock: Option<Arc<dyn Clock>>,
    client: Option<Arc<dyn ObjectStoreClient>>,
}

impl StorageAdapterBuilder {
    /// Creates a new `StorageAdapterBuilder`.
    ///
    /// # Arguments
    ///
    /// * `config` - Backend selection and credentials
    /// * `uploader` - Directory, paths and URL settings of the uploader
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cloud_uploads::storage::{StorageAdapterBuilder, StorageConfig};
    /// use cloud_uploads::uploader::UploaderConfig;
    ///
    /// let config = StorageConfig::local().with_option("path", "/data");
    /// let builder = StorageAdapterBuilder::new(config, UploaderConfig::new("assets"));
    /// ```
    pub fn new(config: StorageConfig, uploader: UploaderConfig) -> Self {
        Self {
            config,
            uploader,
            clock: None,
            client: None,
        }
    }

    /// Use `clock` for cache ids, URL expiry and sweeping instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use an already built client instead of one created from the configuration.
    ///
    /// URL and ACL conventions still follow the configuration.
    pub fn with_client(mut self, client: Arc<dyn ObjectStoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `StorageAdapter` instance.
    ///
    /// No request is made here; the directory is created before the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage client cannot be initialized or the configuration
    /// names an unknown provider.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cloud_uploads::storage::{StorageAdapter, StorageConfig};
    /// use cloud_uploads::uploader::UploaderConfig;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let config = StorageConfig::aws()
    ///     .with_option("region", "eu-central-1")
    ///     .with_option("access_key_id", "ACCESS_KEY")
    ///     .with_option("secret_access_key", "SECRET_ACCESS_KEY");
    /// let adapter = StorageAdapter::builder(config, UploaderConfig::new("assets"))
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> StorageResult<StorageAdapter> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let client = match self.client {
            Some(client) => client,
            None => {
                StorageProviderFactory::from_config(self.config.clone(), &self.uploader.directory)
                    .await?
            }
        };

        let urls = ProviderUrls::from_config(&self.config, &self.uploader, client.local_root())?;
        debug!(
            "Building adapter directory={} provider={} urls={:?}",
            self.uploader.directory,
            urls.provider().name(),
            urls
        );
        let generator = UrlGenerator::new(urls, &self.uploader, Arc::clone(&clock));

        Ok(StorageAdapter {
            bucket: Arc::new(Bucket::new(client, self.uploader, generator, clock)),
        })
    }
}

/// Caches, stores and retrieves uploaded files in one directory.
///
/// Every [`RemoteFile`] handed out shares this adapter's directory handle, so files stay
/// usable after the adapter is dropped.
#[derive(Debug, Clone)]
pub struct StorageAdapter {
    bucket: Arc<Bucket>,
}

impl StorageAdapter {
    /// Creates a new `StorageAdapterBuilder`.
    pub fn builder(config: StorageConfig, uploader: UploaderConfig) -> StorageAdapterBuilder {
        StorageAdapterBuilder::new(config, uploader)
    }

    pub fn uploader(&self) -> &UploaderConfig {
        &self.bucket.uploader
    }

    pub fn client(&self) -> &Arc<dyn ObjectStoreClient> {
        &self.bucket.client
    }

    pub fn provider(&self) -> Provider {
        self.bucket.urls.urls().provider()
    }

    /// Handle bound to `key`, without any request.
    pub fn file(&self, key: impl Into<String>) -> RemoteFile {
        RemoteFile::new(Arc::clone(&self.bucket), key)
    }

    /// Upload `file` below a fresh cache id: `<cache_dir>/<cache-id>/<filename>`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadError`](super::StorageError::UploadError) when the write
    /// fails or the source has no filename.
    pub async fn cache(&self, file: SourceFile) -> StorageResult<RemoteFile> {
        let filename = file.require_filename(&self.bucket.uploader.cache_dir)?;
        let cache_id = CacheId::generate(self.bucket.clock.as_ref());
        let mut remote = self.file(
            self.bucket
                .uploader
                .cache_path(&format!("{}/{}", cache_id, filename)),
        );
        remote.store(file).await?;
        Ok(remote)
    }

    /// Upload `file` to `<store_dir>/<filename>`. A [`SourceFile::Remote`] is copied server-side.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadError`](super::StorageError::UploadError) when the write
    /// fails or the source has no filename.
    pub async fn store(&self, file: SourceFile) -> StorageResult<RemoteFile> {
        let filename = file.require_filename(&self.bucket.uploader.store_dir)?;
        let mut remote = self.file(self.bucket.uploader.store_path(&filename));
        remote.store(file).await?;
        Ok(remote)
    }

    /// Handle to a stored file. No request is made until the handle is read.
    pub fn retrieve(&self, identifier: &str) -> RemoteFile {
        self.file(self.bucket.uploader.store_path(identifier))
    }

    /// Handle to a cached file; `identifier` is `<cache-id>/<filename>`.
    pub fn retrieve_from_cache(&self, identifier: &str) -> RemoteFile {
        self.file(self.bucket.uploader.cache_path(identifier))
    }

    /// Object stores have no directories to remove.
    pub fn delete_dir(&self, path: &str) {
        debug!("Ignoring delete_dir for path={}", path);
    }

    /// Copy a stored file into a fresh cache id so it can be processed again.
    pub async fn cache_stored_file(&self, identifier: &str) -> StorageResult<RemoteFile> {
        let mut stored = self.retrieve(identifier);
        let cache_id = CacheId::generate(self.bucket.clock.as_ref());
        let cache_key = self
            .bucket
            .uploader
            .cache_path(&format!("{}/{}", cache_id, stored.filename()));
        self.bucket.ensure_created().await?;
        stored.copy_to(cache_key).await
    }

    /// Sweeper over this adapter's cache directory.
    pub fn sweeper(&self) -> CacheSweeper {
        CacheSweeper::new(
            Arc::clone(&self.bucket.client),
            self.bucket.uploader.cache_dir.clone(),
            Arc::clone(&self.bucket.clock),
        )
    }

    /// Remove cached files older than `max_age` seconds (one day if `None`).
    pub async fn clean_cached_files(&self, max_age: Option<u64>) -> StorageResult<SweepReport> {
        self.sweeper().sweep(max_age).await
    }
}
