// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use url::Url;

use super::error::StorageResult;

/// Header-style attributes sent with a write or copy (`Content-Type`, ACL header, custom headers).
pub type ObjectAttributes = BTreeMap<String, String>;

/// Metadata about an object in the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Key of the object inside its directory
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Stored content type, if the backend kept one
    pub content_type: Option<String>,

    /// Last modified timestamp (if available)
    pub last_modified: Option<DateTime<Utc>>,
}

/// Full body plus metadata returned by [`ObjectStoreClient::get`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub metadata: ObjectMetadata,
    pub body: Bytes,
}

/// Options applied when writing an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub content_type: Option<String>,

    /// Whether the object should be world-readable
    pub public: bool,

    /// Extra attributes, already including any provider-specific ACL header
    pub attributes: ObjectAttributes,
}

/// Input for [`ObjectStoreClient::sign`].
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub key: String,

    /// Unsigned URL of the object; the signer keeps its host and path
    pub url: Url,

    /// Instant the signature is issued at
    pub signed_at: DateTime<Utc>,

    /// Instant the signed URL stops being valid
    pub expires_at: DateTime<Utc>,

    /// Caller-supplied query parameters passed through to the provider
    pub query: BTreeMap<String, String>,
}

/// Capability set every object storage backend provides.
///
/// Implementations are bound to one directory (bucket) and must be safe to share between
/// independent [`RemoteFile`](super::RemoteFile) handles.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Name of the directory/bucket this client is bound to.
    fn directory(&self) -> &str;

    /// Canonical filesystem root for local stores, used to build `file://` URLs.
    fn local_root(&self) -> Option<&str> {
        None
    }

    /// Create the directory if it is missing.
    async fn create_bucket(&self, name: &str, public: bool) -> StorageResult<()>;

    /// Write `body` to `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadError`](super::StorageError::UploadError) when the write fails.
    async fn put(&self, key: &str, body: Bytes, options: &WriteOptions)
        -> StorageResult<ObjectMetadata>;

    /// Fetch the full body of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](super::StorageError::NotFound) when the object is missing.
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Fetch the metadata of `key`, `None` if the object does not exist.
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMetadata>>;

    /// Remove `key`. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Server-side copy of `src` to `dst`.
    async fn copy(&self, src: &str, dst: &str, attributes: &ObjectAttributes) -> StorageResult<()>;

    /// All keys starting with `prefix`.
    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Produce a time-limited URL, or `None` when the backend cannot sign.
    async fn sign(&self, request: &SignRequest) -> StorageResult<Option<String>>;
}

impl Debug for dyn ObjectStoreClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ObjectStoreClient(directory={})", self.directory())
    }
}

/// Helper function to create an ObjectPath from a string
pub(crate) fn string_to_path(s: &str) -> ObjectPath {
    ObjectPath::from(s)
}
