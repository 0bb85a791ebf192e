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

//! # Cloud Uploads
//!
//! A Rust library for keeping uploaded files in object storage.
//!
//! Cloud Uploads caches incoming files under temporary cache ids, promotes them to their
//! permanent location, hands out lazy handles to stored files and builds public or signed URLs
//! for them. It supports AWS S3, Google Cloud Storage, the local filesystem and an in-memory
//! store.
//!
//! ## Features
//!
//! - **Lazy file handles**: metadata and bodies are fetched on first use and cached
//! - **Server-side copies**: promoting a cached file never downloads it
//! - **URLs**: virtual-hosted or path-style S3 URLs, transfer acceleration, asset hosts
//! - **Signing**: SigV4 query signatures for S3 and V2 signatures for GCS, caller query parameters included
//! - **Cache sweeping**: cached files are removed once their cache id is older than a threshold
//!
//! ## Quick Start
//!
//! ### Local Filesystem Example
//!
//! ```rust,no_run
//! use cloud_uploads::{SourceFile, StorageAdapter, StorageConfig, UploaderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! // Files land in /srv/uploads/assets/...
//! let config = StorageConfig::local().with_option("path", "/srv/uploads");
//! let uploader = UploaderConfig::new("assets");
//!
//! let adapter = StorageAdapter::builder(config, uploader).build().await?;
//!
//! // Cache first, then promote to the store directory
//! let cached = adapter.cache(SourceFile::from_bytes("avatar.png", vec![0u8; 16])).await?;
//! let stored = adapter.store(SourceFile::Remote(cached)).await?;
//! println!("{}", stored.public_url());
//! # Ok(())
//! # }
//! ```
//!
//! ### AWS S3 Example
//!
//! ```rust,no_run
//! use cloud_uploads::{StorageAdapter, StorageConfig, UploaderConfig, UrlOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = StorageConfig::aws()
//!     .with_option("region", "eu-central-1")
//!     .with_option("access_key_id", "ACCESS_KEY")
//!     .with_option("secret_access_key", "SECRET_KEY");
//! let uploader = UploaderConfig::new("my-bucket").with_authenticated_url_expiration(600u64);
//!
//! let adapter = StorageAdapter::builder(config, uploader).build().await?;
//! let file = adapter.retrieve("report.pdf");
//! if let Some(url) = file.authenticated_url(&UrlOptions::new()).await? {
//!     println!("{}", url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - Storage adapter, remote files, URLs and the object store backends
//! - [`uploader`] - Uploader-side configuration, cache ids and source files
//! - [`util`] - Utility functions and helpers

pub mod storage;
pub mod uploader;
pub mod util;

// Re-export commonly used types
pub use storage::{
    RemoteFile, StorageAdapter, StorageConfig, StorageError, StorageResult, UrlOptions,
};
pub use uploader::{SourceFile, UploaderConfig};
