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

//! Object storage for uploaded files
//!
//! This module provides the [`StorageAdapter`] and its [`RemoteFile`] handles on top of the
//! [`ObjectStoreClient`] capability (AWS S3, GCS, local filesystem or in-memory).
//!
//! The backend is a generic `object_store` client; provider differences in URL style, ACL
//! syntax and signing are isolated in [`url`] and [`signer`].

pub mod adapter;
mod bucket;
pub mod config;
pub mod error;
pub mod factory;
pub mod object_store;
pub mod provider;
pub mod remote_file;
pub mod signer;
pub mod sweeper;
pub mod url;

#[cfg(test)]
pub(crate) mod testing;

// Public exports
pub use adapter::{StorageAdapter, StorageAdapterBuilder};
pub use config::{Provider, StorageConfig, StorageType};
pub use error::{StorageError, StorageResult};
pub use factory::StorageProviderFactory;
pub use object_store::ObjectStoreProvider;
pub use provider::{
    ObjectAttributes, ObjectMetadata, ObjectStoreClient, SignRequest, StoredObject, WriteOptions,
};
pub use remote_file::{FileState, RemoteFile};
pub use signer::UrlSigner;
pub use sweeper::{CacheSweeper, SweepReport, DEFAULT_MAX_AGE};
pub use url::{ProviderUrls, UrlGenerator, UrlOptions};
