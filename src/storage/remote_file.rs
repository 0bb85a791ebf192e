//! Handle to one object in the directory.
//!
//! A [`RemoteFile`] starts [`FileState::Bound`] and learns about its object only when asked:
//!
//! ```text
//! Bound ──store/read/head──▶ Fetched
//!   │                           │
//!   ├──head/get: missing──▶ NotFound
//!   └────────delete─────────────┴──▶ Deleted
//! ```
//!
//! Metadata accessors (`size`, `content_type`, `exists`) never fail: a missing or deleted
//! object reads as `None`/`false`. Writes, deletes, copies and signing surface their errors.

use bytes::Bytes;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::bucket::Bucket;
use super::error::{StorageError, StorageResult};
use super::provider::{ObjectAttributes, ObjectMetadata, ObjectStoreClient, WriteOptions};
use super::url::UrlOptions;
use crate::uploader::SourceFile;

/// What a [`RemoteFile`] currently knows about its object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    /// Bound to a key, existence unknown; no request made yet
    Bound,
    /// Metadata known; the body is kept when it was written or read through this handle
    Fetched {
        metadata: ObjectMetadata,
        body: Option<Bytes>,
    },
    /// A lookup found no object
    NotFound,
    /// Removed through this handle
    Deleted,
}

#[derive(Clone)]
pub struct RemoteFile {
    key: String,
    bucket: Arc<Bucket>,
    state: FileState,
}

impl RemoteFile {
    pub(crate) fn new(bucket: Arc<Bucket>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            bucket,
            state: FileState::Bound,
        }
    }

    fn client(&self) -> &dyn ObjectStoreClient {
        self.bucket.client.as_ref()
    }

    /// Key of the object inside the directory.
    pub fn path(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &FileState {
        &self.state
    }

    /// Last segment of the key.
    pub fn filename(&self) -> String {
        self.key
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Filename suffix after the last dot, empty when there is none.
    pub fn extension(&self) -> String {
        let filename = self.filename();
        match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
            _ => String::new(),
        }
    }

    /// `<cache-id>/<filename>` for a key below the cache directory.
    pub fn cache_name(&self) -> Option<&str> {
        let cache_dir = self.bucket.uploader.cache_dir.trim_end_matches('/');
        if cache_dir.is_empty() {
            return Some(&self.key);
        }
        self.key
            .strip_prefix(cache_dir)
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Write `source` to this key, replacing any existing object.
    ///
    /// A [`SourceFile::Remote`] is copied server-side instead of being read back.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadError`] when the write fails.
    pub async fn store(&mut self, source: SourceFile) -> StorageResult<()> {
        self.bucket.ensure_created().await?;

        let source = match source {
            SourceFile::Remote(original) => return self.store_copy(original).await,
            source => source,
        };

        let loaded = source.load(&self.key).await?;
        let options = WriteOptions {
            content_type: loaded.content_type.clone(),
            public: self.bucket.uploader.public,
            attributes: self
                .bucket
                .urls
                .write_attributes(loaded.content_type.as_deref(), &self.bucket.uploader.attributes),
        };

        let metadata = self
            .client()
            .put(&self.key, loaded.body.clone(), &options)
            .await?;
        info!(
            "Wrote key={} size={} public={}",
            self.key, metadata.size, options.public
        );

        self.state = FileState::Fetched {
            metadata,
            body: Some(loaded.body),
        };
        Ok(())
    }

    async fn store_copy(&mut self, mut original: RemoteFile) -> StorageResult<()> {
        let attributes = original.copy_options().await;
        self.client()
            .copy(&original.key, &self.key, &attributes)
            .await
            .map_err(|e| StorageError::upload(&self.key, e))?;
        info!("Copied key={} to key={}", original.key, self.key);

        self.state = match original.state {
            FileState::Fetched { metadata, body } => FileState::Fetched {
                metadata: ObjectMetadata {
                    key: self.key.clone(),
                    ..metadata
                },
                body,
            },
            _ => FileState::Bound,
        };
        Ok(())
    }

    /// Full body of the object, fetched on first call and kept afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when the object is missing or was deleted.
    pub async fn read(&mut self) -> StorageResult<Bytes> {
        match &self.state {
            FileState::Fetched {
                body: Some(body), ..
            } => return Ok(body.clone()),
            FileState::Deleted => {
                return Err(StorageError::NotFound {
                    key: self.key.clone(),
                })
            }
            _ => {}
        }

        debug!("Fetching body of key={}", self.key);
        match self.client().get(&self.key).await {
            Ok(object) => {
                self.state = FileState::Fetched {
                    metadata: object.metadata,
                    body: Some(object.body.clone()),
                };
                Ok(object.body)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.state = FileState::NotFound;
                }
                Err(e)
            }
        }
    }

    /// Metadata of the object, looked up once. Failures read as a missing object.
    async fn metadata(&mut self) -> Option<&ObjectMetadata> {
        if self.state == FileState::Bound {
            debug!("Fetching metadata of key={}", self.key);
            match self.client().head(&self.key).await {
                Ok(Some(metadata)) => {
                    self.state = FileState::Fetched {
                        metadata,
                        body: None,
                    }
                }
                Ok(None) => self.state = FileState::NotFound,
                Err(e) => {
                    warn!("Failed to look up key={}: {}", self.key, e);
                    return None;
                }
            }
        }

        match &self.state {
            FileState::Fetched { metadata, .. } => Some(metadata),
            _ => None,
        }
    }

    /// Size in bytes, `None` when the object is missing.
    pub async fn size(&mut self) -> Option<u64> {
        self.metadata().await.map(|m| m.size)
    }

    /// Stored content type, `None` when unknown or the object is missing.
    pub async fn content_type(&mut self) -> Option<String> {
        self.metadata().await.and_then(|m| m.content_type.clone())
    }

    /// Whether the object currently exists. Always asks the backend.
    pub async fn exists(&mut self) -> bool {
        match self.client().head(&self.key).await {
            Ok(Some(metadata)) => {
                if !matches!(self.state, FileState::Fetched { .. }) {
                    self.state = FileState::Fetched {
                        metadata,
                        body: None,
                    };
                }
                true
            }
            Ok(None) => {
                if self.state != FileState::Deleted {
                    self.state = FileState::NotFound;
                }
                false
            }
            Err(e) => {
                warn!("Failed to check key={}: {}", self.key, e);
                false
            }
        }
    }

    /// Remove the object. Deleting a missing object succeeds.
    pub async fn delete(&mut self) -> StorageResult<()> {
        self.client().delete(&self.key).await?;
        info!("Deleted key={}", self.key);
        self.state = FileState::Deleted;
        Ok(())
    }

    /// Attributes sent with a copy of this file: content type, ACL header, custom attributes.
    pub async fn copy_options(&mut self) -> ObjectAttributes {
        let content_type = self.content_type().await;
        self.bucket
            .urls
            .write_attributes(content_type.as_deref(), &self.bucket.uploader.attributes)
    }

    /// Server-side copy to `new_key`, returning a handle bound to the copy.
    pub async fn copy_to(&mut self, new_key: impl Into<String>) -> StorageResult<RemoteFile> {
        let new_key = new_key.into();
        let attributes = self.copy_options().await;
        self.client().copy(&self.key, &new_key, &attributes).await?;
        info!("Copied key={} to key={}", self.key, new_key);
        Ok(RemoteFile::new(Arc::clone(&self.bucket), new_key))
    }

    /// Public URL, ignoring the uploader's public flag.
    pub fn public_url(&self) -> String {
        self.bucket.urls.public_url(self)
    }

    /// Time-limited signed URL, `None` when the provider cannot sign.
    pub async fn authenticated_url(&self, options: &UrlOptions) -> StorageResult<Option<String>> {
        self.bucket
            .urls
            .authenticated_url(self.client(), &self.key, options)
            .await
    }

    /// Public URL for public uploaders, signed URL otherwise. Never fetches the object.
    pub async fn url(&self, options: &UrlOptions) -> StorageResult<Option<String>> {
        self.bucket.urls.url(self.client(), self, options).await
    }

    /// Write the body to `local_path`, creating parent directories.
    pub async fn write_to(&mut self, local_path: impl AsRef<Path>) -> StorageResult<()> {
        let local_path = local_path.as_ref();
        let body = self.read().await?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &body).await?;
        debug!("Wrote key={} to {}", self.key, local_path.display());
        Ok(())
    }
}

impl Debug for RemoteFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RemoteFile(directory={}, key={}, state={:?})",
            self.bucket.name(),
            self.key,
            self.state
        )
    }
}
