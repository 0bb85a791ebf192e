//! Test doubles for the storage layer.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use std::sync::{Arc, Mutex, MutexGuard};

use super::bucket::Bucket;
use super::config::StorageConfig;
use super::error::StorageResult;
use super::object_store::ObjectStoreProvider;
use super::provider::{
    ObjectAttributes, ObjectMetadata, ObjectStoreClient, SignRequest, StoredObject, WriteOptions,
};
use super::url::{ProviderUrls, UrlGenerator};
use crate::uploader::UploaderConfig;
use crate::util::{Clock, FixedClock};

/// Instant every test bucket starts at: 2016-10-31T16:40:00Z.
pub(crate) const TEST_NOW: i64 = 1_477_932_000;

pub(crate) fn memory_client(directory: &str) -> Arc<dyn ObjectStoreClient> {
    memory_provider(StorageConfig::memory(), directory)
}

pub(crate) fn memory_provider(config: StorageConfig, directory: &str) -> Arc<dyn ObjectStoreClient> {
    Arc::new(
        ObjectStoreProvider::with_store(config, Arc::new(InMemory::new()), "memory://", directory)
            .unwrap(),
    )
}

/// Calls seen by a [`RecordingClient`], in order per kind.
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub buckets: Vec<(String, bool)>,
    pub puts: Vec<(String, WriteOptions)>,
    pub gets: Vec<String>,
    pub heads: Vec<String>,
    pub deletes: Vec<String>,
    pub copies: Vec<(String, String, ObjectAttributes)>,
    pub lists: Vec<String>,
    pub signs: Vec<SignRequest>,
}

/// Forwards to an inner client and records every call.
pub(crate) struct RecordingClient {
    inner: Arc<dyn ObjectStoreClient>,
    calls: Mutex<Calls>,
}

impl RecordingClient {
    pub(crate) fn new(inner: Arc<dyn ObjectStoreClient>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Calls::default()),
        })
    }

    pub(crate) fn calls(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ObjectStoreClient for RecordingClient {
    fn directory(&self) -> &str {
        self.inner.directory()
    }

    fn local_root(&self) -> Option<&str> {
        self.inner.local_root()
    }

    async fn create_bucket(&self, name: &str, public: bool) -> StorageResult<()> {
        self.calls().buckets.push((name.to_string(), public));
        self.inner.create_bucket(name, public).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: &WriteOptions,
    ) -> StorageResult<ObjectMetadata> {
        self.calls().puts.push((key.to_string(), options.clone()));
        self.inner.put(key, body, options).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        self.calls().gets.push(key.to_string());
        self.inner.get(key).await
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>> {
        self.calls().heads.push(key.to_string());
        self.inner.head(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.calls().deletes.push(key.to_string());
        self.inner.delete(key).await
    }

    async fn copy(&self, src: &str, dst: &str, attributes: &ObjectAttributes) -> StorageResult<()> {
        self.calls()
            .copies
            .push((src.to_string(), dst.to_string(), attributes.clone()));
        self.inner.copy(src, dst, attributes).await
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.calls().lists.push(prefix.to_string());
        self.inner.list_by_prefix(prefix).await
    }

    async fn sign(&self, request: &SignRequest) -> StorageResult<Option<String>> {
        self.calls().signs.push(request.clone());
        self.inner.sign(request).await
    }
}

/// Bucket over a recording in-memory client, frozen at [`TEST_NOW`].
pub(crate) fn test_bucket(
    config: StorageConfig,
    uploader: UploaderConfig,
) -> (Arc<Bucket>, Arc<RecordingClient>) {
    test_bucket_at(config, uploader, Arc::new(FixedClock::at_timestamp(TEST_NOW)))
}

pub(crate) fn test_bucket_at(
    config: StorageConfig,
    uploader: UploaderConfig,
    clock: Arc<dyn Clock>,
) -> (Arc<Bucket>, Arc<RecordingClient>) {
    let recorder = RecordingClient::new(memory_provider(config.clone(), &uploader.directory));
    let urls = ProviderUrls::from_config(&config, &uploader, None).unwrap();
    let generator = UrlGenerator::new(urls, &uploader, Arc::clone(&clock));
    let client: Arc<dyn ObjectStoreClient> = recorder.clone();
    let bucket = Bucket::new(client, uploader, generator, clock);
    (Arc::new(bucket), recorder)
}
