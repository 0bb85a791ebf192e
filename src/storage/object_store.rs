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

use super::config::{StorageConfig, StorageType};
use super::error::{StorageError, StorageResult};
use super::provider::{
    string_to_path, ObjectAttributes, ObjectMetadata, ObjectStoreClient, SignRequest,
    StoredObject, WriteOptions,
};
use super::signer::UrlSigner;
use crate::util::retry::retry_with_max_retries;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use object_store::{
    aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, local::LocalFileSystem,
    memory::InMemory, Attribute, AttributeValue, Attributes, ClientOptions, GetOptions,
    ObjectStore, ObjectStoreExt, PutOptions, RetryConfig,
};
use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// [`ObjectStoreClient`] backed by any object_store backend
pub struct ObjectStoreProvider {
    pub config: StorageConfig,
    pub store: Arc<dyn ObjectStore>,
    /// Canonical root for local stores, bucket URL otherwise
    pub base_path: String,
    directory: String,
    signer: Option<UrlSigner>,
}

impl ObjectStoreProvider {
    /// Create a provider bound to `directory`.
    ///
    /// # Arguments
    ///
    /// * `config` - Storage configuration specifying the storage type and options
    /// * `directory` - Bucket name; also the default for a missing `bucket` option
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The storage configuration is invalid
    /// * Required configuration options are missing
    /// * The storage backend cannot be created (e.g., invalid credentials)
    pub async fn new(config: StorageConfig, directory: impl Into<String>) -> StorageResult<Self> {
        let directory: String = directory.into();
        let mut config = config;
        if config.storage_type != StorageType::Local && config.get_option("bucket").is_none() {
            config = config.with_option("bucket", directory.clone());
        }

        let (store, base_path) = Self::build_store(&config)?;
        Self::with_store(config, Arc::from(store), base_path, directory)
    }

    /// Wrap an already built store.
    pub fn with_store(
        config: StorageConfig,
        store: Arc<dyn ObjectStore>,
        base_path: impl Into<String>,
        directory: impl Into<String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let directory = directory.into();
        let signer = UrlSigner::from_config(&config)?;

        info!(
            "Created storage client type={} directory={} base_path={} signing={}",
            config.storage_type_str(),
            directory,
            base_path,
            signer.is_some()
        );

        Ok(Self {
            config,
            store,
            base_path,
            directory,
            signer,
        })
    }

    /// Build the appropriate object store based on configuration.
    ///
    /// # Returns
    ///
    /// A tuple of the object store and its base path/URL
    fn build_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        match config.storage_type {
            StorageType::Memory => Ok((Box::new(InMemory::new()), "memory://".to_string())),
            StorageType::Local => Self::build_local_store(config),
            StorageType::Aws => Self::build_aws_store(config),
            StorageType::Gcs => Self::build_gcs_store(config),
        }
    }

    /// Build a local filesystem store.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The 'path' option is missing from configuration
    /// * The path cannot be canonicalized (doesn't exist or permission denied)
    /// * The path is not a directory
    fn build_local_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let path = config.options.get("path").ok_or_else(|| {
            StorageError::ConfigError("Local storage requires 'path' option".to_string())
        })?;
        let base_path = PathBuf::from(path);

        let canonical_path = base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve path '{}': {} (path must exist)",
                path, e
            ))
        })?;

        if !canonical_path.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Base path is not a directory: {}",
                canonical_path.display()
            )));
        }

        let store = LocalFileSystem::new_with_prefix(&canonical_path).map_err(|e| {
            StorageError::ConfigError(format!("Failed to create local store: {}", e))
        })?;

        let base_path_str = canonical_path.to_string_lossy().to_string();
        Ok((Box::new(store), base_path_str))
    }

    /// Build connection options from configuration.
    fn build_connection_options(config: &StorageConfig) -> ClientOptions {
        let mut client_options = ClientOptions::default();
        if let Some(timeout_str) = config.options.get("timeout") {
            if timeout_str == "0" || timeout_str == "disabled" {
                client_options = client_options.with_timeout_disabled();
            } else if let Ok(sec) = timeout_str.parse::<u64>() {
                client_options = client_options.with_timeout(Duration::from_secs(sec))
            }
        };
        if let Some(connect_timeout_str) = config.options.get("connect_timeout") {
            if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
                client_options = client_options.with_connect_timeout_disabled();
            } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
                client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_idle_timeout_str) = config.options.get("pool_idle_timeout") {
            if let Ok(sec) = pool_idle_timeout_str.parse::<u64>() {
                client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_max_idle_per_host_str) = config.options.get("pool_max_idle_per_host") {
            if let Ok(max_idle) = pool_max_idle_per_host_str.parse::<usize>() {
                client_options = client_options.with_pool_max_idle_per_host(max_idle)
            }
        }
        if config
            .options
            .get("allow_http")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            client_options = client_options.with_allow_http(true);
        }
        client_options
    }

    /// Build retry options from configuration.
    fn build_retry_options(config: &StorageConfig) -> RetryConfig {
        let default_retry_config = RetryConfig::default();
        let max_retries = config
            .options
            .get("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(default_retry_config.max_retries);
        let retry_timeout = config
            .options
            .get("retry_timeout")
            .and_then(|s| Some(Duration::from_secs(s.parse::<u64>().ok()?)))
            .unwrap_or(default_retry_config.retry_timeout);
        RetryConfig {
            backoff: Default::default(),
            max_retries,
            retry_timeout,
        }
    }

    /// Max retries for reads and listings (defaults to 10).
    fn get_max_retries(config: &StorageConfig) -> usize {
        config
            .options
            .get("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10)
    }

    async fn retry_operation<F, Fut, T>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let max_retries = Self::get_max_retries(&self.config);
        retry_with_max_retries(max_retries, operation_name, operation).await
    }

    /// Build an AWS S3 store.
    fn build_aws_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = AmazonS3Builder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "region" => builder = builder.with_region(value),
                "access_key_id" => builder = builder.with_access_key_id(value),
                "secret_access_key" => builder = builder.with_secret_access_key(value),
                "session_token" | "token" => builder = builder.with_token(value),
                "endpoint" => builder = builder.with_endpoint(value),
                // Already handled by `build_connection_options` and `build_retry_options`
                "timeout"
                | "connect_timeout"
                | "max_retries"
                | "retry_timeout"
                | "pool_idle_timeout"
                | "pool_max_idle_per_host"
                | "allow_http" => (),
                _ => {
                    tracing::warn!("Unknown AWS S3 option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))?;

        let base_url = match bucket {
            Some(bucket_name) => format!("s3://{}", bucket_name),
            None => "s3://".to_string(),
        };

        Ok((Box::new(store), base_url))
    }

    /// Build a GCS store.
    fn build_gcs_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = GoogleCloudStorageBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "service_account_key_path" => builder = builder.with_service_account_path(value),
                "service_account_key" => builder = builder.with_service_account_key(value),
                // Signing keys, read by `UrlSigner`
                "hmac_access_id" | "hmac_secret" | "endpoint" => (),
                "timeout"
                | "connect_timeout"
                | "max_retries"
                | "retry_timeout"
                | "pool_idle_timeout"
                | "pool_max_idle_per_host"
                | "allow_http" => (),
                _ => {
                    tracing::warn!("Unknown GCS option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))?;

        let base_url = match bucket {
            Some(bucket_name) => format!("gs://{}", bucket_name),
            None => "gs://".to_string(),
        };

        Ok((Box::new(store), base_url))
    }

    fn is_local(&self) -> bool {
        self.config.storage_type == StorageType::Local
    }

    /// Location of `key` inside the store. Local stores keep one sub-directory per bucket.
    fn location(&self, key: &str) -> object_store::path::Path {
        if self.is_local() && !self.directory.is_empty() {
            string_to_path(&format!("{}/{}", self.directory, key.trim_start_matches('/')))
        } else {
            string_to_path(key)
        }
    }

    /// Key inside the directory for a location returned by the store.
    fn key_of(&self, location: &object_store::path::Path) -> String {
        let location = location.to_string();
        if self.is_local() && !self.directory.is_empty() {
            if let Some(key) = location.strip_prefix(&format!("{}/", self.directory)) {
                return key.to_string();
            }
        }
        location
    }

    /// Map header-style attributes onto object_store attributes. Local stores reject them.
    ///
    /// Provider headers (ACL, encryption, storage class) have no object_store counterpart and
    /// are reported instead of being written as user metadata.
    fn to_store_attributes(
        &self,
        key: &str,
        attributes: &ObjectAttributes,
        public: bool,
    ) -> Attributes {
        let mut mapped = Attributes::new();
        if self.is_local() {
            if !attributes.is_empty() {
                debug!(
                    "Local store ignores attributes for key={}: {:?}",
                    key,
                    attributes.keys().collect::<Vec<_>>()
                );
            }
            return mapped;
        }

        let mut unapplied = Vec::new();
        for (name, value) in attributes {
            match store_attribute(name) {
                Some(attribute) => {
                    mapped.insert(attribute, AttributeValue::from(value.clone()));
                }
                None => unapplied.push(name.as_str()),
            }
        }
        if !unapplied.is_empty() {
            if self.is_remote() {
                warn!(
                    "Cannot apply provider headers {:?} to key={} public={}; bucket policy applies",
                    unapplied, key, public
                );
            } else {
                debug!(
                    "Dropped provider headers {:?} for key={} public={}",
                    unapplied, key, public
                );
            }
        }
        mapped
    }

    fn is_remote(&self) -> bool {
        matches!(self.config.storage_type, StorageType::Aws | StorageType::Gcs)
    }
}

/// Headers addressed to the provider API itself rather than stored with the object.
fn is_provider_header(name: &str) -> bool {
    name.starts_with("x-amz-")
        || name.starts_with("x-goog-")
        || name == "destination_predefined_acl"
}

/// object_store attribute for a header-style name, `None` for provider headers.
///
/// `x-amz-meta-*` and `x-goog-meta-*` lose their prefix; object_store adds the provider's own.
fn store_attribute(name: &str) -> Option<Attribute> {
    let lower = name.to_ascii_lowercase();
    let attribute = match lower.as_str() {
        "content-type" => Attribute::ContentType,
        "cache-control" => Attribute::CacheControl,
        "content-disposition" => Attribute::ContentDisposition,
        "content-encoding" => Attribute::ContentEncoding,
        "content-language" => Attribute::ContentLanguage,
        other => match other
            .strip_prefix("x-amz-meta-")
            .or_else(|| other.strip_prefix("x-goog-meta-"))
        {
            Some(meta) if !meta.is_empty() => Attribute::Metadata(Cow::Owned(meta.to_string())),
            _ if is_provider_header(other) => return None,
            _ => Attribute::Metadata(Cow::Owned(name.to_string())),
        },
    };
    Some(attribute)
}

fn content_type_of(attributes: &Attributes) -> Option<String> {
    attributes.get(&Attribute::ContentType).map(|v| {
        let value: &str = v.as_ref();
        value.to_string()
    })
}

#[async_trait]
impl ObjectStoreClient for ObjectStoreProvider {
    fn directory(&self) -> &str {
        &self.directory
    }

    fn local_root(&self) -> Option<&str> {
        self.is_local().then_some(self.base_path.as_str())
    }

    async fn create_bucket(&self, name: &str, public: bool) -> StorageResult<()> {
        if self.is_local() {
            let mut dir = PathBuf::from(&self.base_path);
            dir.push(name);
            tokio::fs::create_dir_all(&dir).await?;
            debug!("Ensured local bucket directory={}", dir.display());
        } else {
            // Buckets of remote stores are provisioned outside this crate
            debug!(
                "Skipping bucket creation for type={} bucket={} public={}",
                self.config.storage_type_str(),
                name,
                public
            );
        }
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: &WriteOptions,
    ) -> StorageResult<ObjectMetadata> {
        let mut attributes = options.attributes.clone();
        if let Some(content_type) = &options.content_type {
            attributes
                .entry("Content-Type".to_string())
                .or_insert_with(|| content_type.clone());
        }

        let size = body.len() as u64;
        let put_options = PutOptions {
            attributes: self.to_store_attributes(key, &attributes, options.public),
            ..Default::default()
        };
        self.store
            .put_opts(&self.location(key), body.into(), put_options)
            .await
            .map_err(|e| StorageError::upload(key, e))?;

        debug!("Stored key={} size={}", key, size);
        Ok(ObjectMetadata {
            key: key.to_string(),
            size,
            content_type: attributes.get("Content-Type").cloned(),
            last_modified: None,
        })
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        let location = self.location(key);
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("get({})", key), || async {
            let result = store
                .get(&location)
                .await
                .map_err(|e| StorageError::request("get", key, e))?;
            let content_type = content_type_of(&result.attributes);
            let meta = result.meta.clone();
            let body = result
                .bytes()
                .await
                .map_err(|e| StorageError::request("get", key, e))?;

            Ok(StoredObject {
                metadata: ObjectMetadata {
                    key: key.to_string(),
                    size: meta.size,
                    content_type,
                    last_modified: Some(meta.last_modified),
                },
                body,
            })
        })
        .await
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>> {
        let location = self.location(key);
        let store = Arc::clone(&self.store);

        let result = self
            .retry_operation(&format!("head({})", key), || async {
                let options = GetOptions {
                    head: true,
                    ..Default::default()
                };
                let result = store
                    .get_opts(&location, options)
                    .await
                    .map_err(|e| StorageError::request("head", key, e))?;
                Ok(ObjectMetadata {
                    key: key.to_string(),
                    size: result.meta.size,
                    content_type: content_type_of(&result.attributes),
                    last_modified: Some(result.meta.last_modified),
                })
            })
            .await;

        match result {
            Ok(metadata) => Ok(Some(metadata)),
            Err(StorageError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self.store.delete(&self.location(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                debug!("Deleted key={}", key);
                Ok(())
            }
            Err(e) => Err(StorageError::request("delete", key, e)),
        }
    }

    async fn copy(&self, src: &str, dst: &str, attributes: &ObjectAttributes) -> StorageResult<()> {
        self.store
            .copy(&self.location(src), &self.location(dst))
            .await
            .map_err(|e| StorageError::request("copy", src, e))?;

        // object_store copies keep the source attributes
        let (provider, kept): (Vec<&String>, Vec<&String>) =
            attributes.keys().partition(|name| store_attribute(name).is_none());
        if !provider.is_empty() && self.is_remote() {
            warn!(
                "Cannot apply provider headers {:?} to copied key={}; bucket policy applies",
                provider, dst
            );
        }
        if !kept.is_empty() || !provider.is_empty() {
            debug!(
                "Copied key={} to key={}, source attributes kept over {:?}",
                src, dst, kept
            );
        }
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let location = self.location(prefix.trim_end_matches('/'));
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("list_by_prefix({})", prefix), || async {
            let mut keys = Vec::new();
            let mut stream = store.list(Some(&location));
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| StorageError::request("list", prefix, e))?;
                keys.push(self.key_of(&meta.location));
            }
            Ok(keys)
        })
        .await
    }

    async fn sign(&self, request: &SignRequest) -> StorageResult<Option<String>> {
        match &self.signer {
            Some(signer) => signer.sign(request).map(Some),
            None => {
                debug!(
                    "No signing credentials for type={}, key={}",
                    self.config.storage_type_str(),
                    request.key
                );
                Ok(None)
            }
        }
    }
}

impl Debug for ObjectStoreProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObjectStoreClient(type={}, directory={}, base_path={})",
            self.config.storage_type_str(),
            self.directory,
            self.base_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn local_provider(temp_dir: &TempDir) -> ObjectStoreProvider {
        let config = StorageConfig::local().with_option("path", temp_dir.path().to_str().unwrap());
        ObjectStoreProvider::new(config, "bucket").await.unwrap()
    }

    #[test]
    fn test_build_connection_options_default() {
        let config = StorageConfig::aws();
        let options = ObjectStoreProvider::build_connection_options(&config);
        let debug_str = format!("{:?}", options);
        assert!(debug_str.contains("ClientOptions"));
    }

    #[test]
    fn test_build_retry_options_custom() {
        let config = StorageConfig::aws()
            .with_option("max_retries", "3")
            .with_option("retry_timeout", "60");
        let retry = ObjectStoreProvider::build_retry_options(&config);
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.retry_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_retry_options_invalid_values() {
        let config = StorageConfig::aws()
            .with_option("max_retries", "many")
            .with_option("retry_timeout", "soon");
        let retry = ObjectStoreProvider::build_retry_options(&config);
        let default_retry = RetryConfig::default();
        assert_eq!(retry.max_retries, default_retry.max_retries);
        assert_eq!(retry.retry_timeout, default_retry.retry_timeout);
    }

    #[test]
    fn test_get_max_retries() {
        let mut config = StorageConfig::memory();
        config.options.remove("max_retries");
        assert_eq!(ObjectStoreProvider::get_max_retries(&config), 10);
        assert_eq!(
            ObjectStoreProvider::get_max_retries(&config.clone().with_option("max_retries", "2")),
            2
        );
        assert_eq!(
            ObjectStoreProvider::get_max_retries(&config.with_option("max_retries", "x")),
            10
        );
    }

    #[tokio::test]
    async fn test_new_local_provider() {
        let temp_dir = TempDir::new().unwrap();
        let provider = local_provider(&temp_dir).await;

        let base_path = provider.base_path.replace("\\\\?\\", "").replace('\\', "/");
        let canonical_temp = temp_dir
            .path()
            .canonicalize()
            .unwrap()
            .to_str()
            .unwrap()
            .replace("\\\\?\\", "")
            .replace('\\', "/");
        assert!(
            base_path.contains(&canonical_temp),
            "base_path '{}' should contain '{}'",
            base_path,
            canonical_temp
        );
        assert_eq!(provider.directory(), "bucket");
    }

    #[tokio::test]
    async fn test_new_local_provider_invalid_path() {
        let config = StorageConfig::local().with_option("path", "/nonexistent/invalid/path");
        match ObjectStoreProvider::new(config, "bucket").await {
            Err(StorageError::ConfigError(msg)) => assert!(msg.contains("Failed to resolve path")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_local_provider_missing_path() {
        match ObjectStoreProvider::new(StorageConfig::local(), "bucket").await {
            Err(StorageError::ConfigError(msg)) => assert!(msg.contains("path")),
            other => panic!("Expected ConfigError for missing path, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_local_provider_file_not_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_file.txt");
        fs::write(&file_path, "test content").unwrap();

        let config = StorageConfig::local().with_option("path", file_path.to_str().unwrap());
        match ObjectStoreProvider::new(config, "bucket").await {
            Err(StorageError::ConfigError(msg)) => assert!(msg.contains("not a directory")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_memory_defaults_bucket_to_directory() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "assets")
            .await
            .unwrap();
        assert_eq!(provider.config.get_option("bucket"), Some(&"assets".to_string()));
        assert_eq!(provider.base_path, "memory://");
    }

    #[tokio::test]
    async fn test_local_create_bucket_and_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let provider = local_provider(&temp_dir).await;
        provider.create_bucket("bucket", true).await.unwrap();
        assert!(temp_dir.path().join("bucket").is_dir());

        let options = WriteOptions {
            content_type: Some("image/jpeg".to_string()),
            public: true,
            attributes: [("x-amz-acl".to_string(), "public-read".to_string())].into(),
        };
        let metadata = provider
            .put("uploads/test.jpg", Bytes::from("this is stuff"), &options)
            .await
            .unwrap();
        assert_eq!(metadata.size, 13);
        assert_eq!(metadata.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(
            fs::read(temp_dir.path().join("bucket/uploads/test.jpg")).unwrap(),
            b"this is stuff"
        );

        let object = provider.get("uploads/test.jpg").await.unwrap();
        assert_eq!(object.body, Bytes::from("this is stuff"));
        assert_eq!(object.metadata.size, 13);
        assert!(object.metadata.last_modified.is_some());

        let keys = provider.list_by_prefix("uploads").await.unwrap();
        assert_eq!(keys, vec!["uploads/test.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_local_head_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let provider = local_provider(&temp_dir).await;
        provider
            .put("a/b.txt", Bytes::from("content"), &WriteOptions::default())
            .await
            .unwrap();

        let metadata = provider.head("a/b.txt").await.unwrap().unwrap();
        assert_eq!(metadata.size, 7);
        assert!(provider.head("a/missing.txt").await.unwrap().is_none());

        provider.delete("a/b.txt").await.unwrap();
        assert!(provider.head("a/b.txt").await.unwrap().is_none());
        // deleting again is not an error
        provider.delete("a/b.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let provider = local_provider(&temp_dir).await;
        let result = provider.get("nonexistent.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound { key }) if key == "nonexistent.txt"));
    }

    #[tokio::test]
    async fn test_memory_keeps_attributes() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        let options = WriteOptions {
            content_type: Some("image/png".to_string()),
            public: false,
            attributes: [("Cache-Control".to_string(), "max-age=60".to_string())].into(),
        };
        provider
            .put("uploads/a.png", Bytes::from_static(b"png"), &options)
            .await
            .unwrap();

        let metadata = provider.head("uploads/a.png").await.unwrap().unwrap();
        assert_eq!(metadata.content_type.as_deref(), Some("image/png"));

        let result = provider
            .store
            .get(&string_to_path("uploads/a.png"))
            .await
            .unwrap();
        let cache_control: &str = result.attributes.get(&Attribute::CacheControl).unwrap().as_ref();
        assert_eq!(cache_control, "max-age=60");
    }

    fn metadata_of(attributes: &Attributes, name: &'static str) -> Option<String> {
        attributes
            .get(&Attribute::Metadata(Cow::Borrowed(name)))
            .map(|v| {
                let value: &str = v.as_ref();
                value.to_string()
            })
    }

    #[tokio::test]
    async fn test_provider_headers_are_not_user_metadata() {
        let provider = ObjectStoreProvider::new(
            StorageConfig::memory().with_option("mock_provider", "aws"),
            "bucket",
        )
        .await
        .unwrap();
        let options = WriteOptions {
            content_type: Some("image/jpeg".to_string()),
            public: true,
            attributes: [
                ("x-amz-acl".to_string(), "public-read".to_string()),
                ("x-amz-server-side-encryption".to_string(), "AES256".to_string()),
                ("X-Amz-Meta-Owner".to_string(), "alice".to_string()),
                ("x-custom".to_string(), "1".to_string()),
            ]
            .into(),
        };
        provider
            .put("uploads/test.jpg", Bytes::from("this is stuff"), &options)
            .await
            .unwrap();

        let result = provider
            .store
            .get(&string_to_path("uploads/test.jpg"))
            .await
            .unwrap();
        let attributes = &result.attributes;
        assert_eq!(metadata_of(attributes, "x-amz-acl"), None);
        assert_eq!(metadata_of(attributes, "x-amz-server-side-encryption"), None);
        assert_eq!(metadata_of(attributes, "owner").as_deref(), Some("alice"));
        assert_eq!(metadata_of(attributes, "x-custom").as_deref(), Some("1"));
        assert_eq!(content_type_of(attributes).as_deref(), Some("image/jpeg"));
        assert_eq!(attributes.len(), 3);
    }

    #[test]
    fn test_store_attribute_mapping() {
        assert_eq!(store_attribute("Content-Type"), Some(Attribute::ContentType));
        assert_eq!(store_attribute("cache-control"), Some(Attribute::CacheControl));
        assert_eq!(store_attribute("x-goog-acl"), None);
        assert_eq!(store_attribute("destination_predefined_acl"), None);
        assert_eq!(store_attribute("X-Amz-Storage-Class"), None);
        assert_eq!(
            store_attribute("x-goog-meta-source"),
            Some(Attribute::Metadata(Cow::Borrowed("source")))
        );
        assert_eq!(store_attribute("x-amz-meta-"), None);
    }

    #[tokio::test]
    async fn test_copy_keeps_source_attributes() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        let options = WriteOptions {
            content_type: Some("image/png".to_string()),
            public: false,
            attributes: ObjectAttributes::new(),
        };
        provider
            .put("uploads/tmp/1-2-3/a.png", Bytes::from_static(b"png"), &options)
            .await
            .unwrap();
        let acl: ObjectAttributes =
            [("destination_predefined_acl".to_string(), "publicRead".to_string())].into();
        provider
            .copy("uploads/tmp/1-2-3/a.png", "uploads/a.png", &acl)
            .await
            .unwrap();

        let result = provider.store.get(&string_to_path("uploads/a.png")).await.unwrap();
        assert_eq!(content_type_of(&result.attributes).as_deref(), Some("image/png"));
        assert_eq!(metadata_of(&result.attributes, "destination_predefined_acl"), None);
    }

    #[tokio::test]
    async fn test_local_root_only_for_local_stores() {
        let temp_dir = TempDir::new().unwrap();
        let provider = local_provider(&temp_dir).await;
        assert_eq!(provider.local_root(), Some(provider.base_path.as_str()));

        let memory = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        assert_eq!(memory.local_root(), None);
    }

    #[tokio::test]
    async fn test_copy_and_list() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        provider
            .put("uploads/tmp/1-2-3/a.txt", Bytes::from("x"), &WriteOptions::default())
            .await
            .unwrap();
        provider
            .copy("uploads/tmp/1-2-3/a.txt", "uploads/a.txt", &ObjectAttributes::new())
            .await
            .unwrap();

        let mut keys = provider.list_by_prefix("uploads/").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["uploads/a.txt", "uploads/tmp/1-2-3/a.txt"]);
        assert_eq!(
            provider.list_by_prefix("uploads/tmp").await.unwrap(),
            vec!["uploads/tmp/1-2-3/a.txt"]
        );

        let missing = provider.copy("nope", "dst", &ObjectAttributes::new()).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_sign_without_credentials_returns_none() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        let now = chrono::Utc::now();
        let request = SignRequest {
            key: "a.txt".to_string(),
            url: url::Url::parse("memory://bucket/a.txt").unwrap(),
            signed_at: now,
            expires_at: now + chrono::Duration::seconds(60),
            query: Default::default(),
        };
        assert!(provider.sign(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debug_implementation() {
        let provider = ObjectStoreProvider::new(StorageConfig::memory(), "bucket")
            .await
            .unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("type=memory"));
        assert!(debug_str.contains("directory=bucket"));
    }
}
