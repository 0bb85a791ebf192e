// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{StorageError, StorageResult};

/// Storage backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// In-process store, used for tests and local development
    Memory,
    /// Local filesystem storage
    Local,
    /// AWS S3 storage
    Aws,
    /// Google Cloud Storage
    Gcs,
}

/// Provider family that decides URL style and ACL syntax.
///
/// Selected once from the [`StorageConfig`]; a memory backend can emulate any family
/// through the `mock_provider` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Aws,
    Google,
    Local,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Google => "google",
            Provider::Local => "local",
        }
    }
}

/// Generic configuration for storage backends using object_store
///
/// Provider-specific options are kept in a string map and applied to the matching
/// object_store builder.
///
/// # Examples
///
/// ## In-memory store emulating S3
/// ```
/// use cloud_uploads::storage::StorageConfig;
///
/// let config = StorageConfig::memory()
///     .with_option("mock_provider", "aws")
///     .with_option("access_key_id", "AKIDEXAMPLE")
///     .with_option("secret_access_key", "secret");
/// ```
///
/// ## AWS S3
/// ```
/// use cloud_uploads::storage::StorageConfig;
///
/// let config = StorageConfig::new("s3")
///     .with_option("bucket", "my-bucket")
///     .with_option("region", "eu-central-1")
///     .with_option("access_key_id", "ACCESS_KEY")
///     .with_option("secret_access_key", "SECRET_ACCESS_KEY");
/// ```
///
/// ## GCS
/// ```
/// use cloud_uploads::storage::StorageConfig;
///
/// let config = StorageConfig::new("gcs")
///     .with_option("bucket", "my-bucket")
///     .with_option("service_account_key_path", "/path/to/key.json")
///     .with_option("hmac_access_id", "GOOG1EXAMPLE")
///     .with_option("hmac_secret", "secret");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    ///
    /// All backends:
    /// - bucket: Directory/bucket name (defaults to the uploader's directory)
    /// - endpoint: Custom endpoint URL used for public URLs
    ///
    /// AWS S3 (also read by a memory backend emulating `aws`):
    /// - region, access_key_id, secret_access_key, session_token, allow_http
    ///
    /// GCS (also read by a memory backend emulating `gcs`):
    /// - service_account_key_path, service_account_key
    /// - hmac_access_id, hmac_secret: interoperability keys used for signed URLs
    ///
    /// Local:
    /// - path: Root directory holding one sub-directory per bucket
    ///
    /// Memory:
    /// - mock_provider: "aws", "gcs" or "local" (default)
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl StorageConfig {
    /// Create a new storage configuration.
    ///
    /// # Arguments
    ///
    /// * `storage_type` - One of "memory", "local", "aws"/"s3", "gcs"/"gcp"/"google"
    ///
    /// # Panics
    ///
    /// Panics on an unknown storage type; use [`StorageConfig::parse`] for untrusted input.
    pub fn new(storage_type: impl Into<String>) -> Self {
        let storage_type_str = storage_type.into();
        match Self::parse(&storage_type_str) {
            Ok(config) => config,
            Err(_) => panic!("Unknown storage type: {}", storage_type_str),
        }
    }

    /// Fallible variant of [`StorageConfig::new`].
    pub fn parse(storage_type: &str) -> StorageResult<Self> {
        let storage_type = match storage_type.to_lowercase().as_str() {
            "memory" | "mock" => StorageType::Memory,
            "local" => StorageType::Local,
            "aws" | "s3" => StorageType::Aws,
            "gcs" | "gcp" | "google" => StorageType::Gcs,
            other => {
                return Err(StorageError::ConfigError(format!(
                    "Unknown storage type: {}",
                    other
                )))
            }
        };
        Ok(Self::with_type(storage_type))
    }

    fn with_type(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            options: Self::default_options(),
        }
    }

    /// Create an in-memory storage configuration.
    pub fn memory() -> Self {
        Self::with_type(StorageType::Memory)
    }

    /// Create a local filesystem storage configuration.
    pub fn local() -> Self {
        Self::with_type(StorageType::Local)
    }

    /// Create an AWS S3 storage configuration.
    pub fn aws() -> Self {
        Self::with_type(StorageType::Aws)
    }

    /// Create a GCS storage configuration.
    pub fn gcs() -> Self {
        Self::with_type(StorageType::Gcs)
    }

    /// Get default options for all storage types.
    ///
    /// # Returns
    ///
    /// A HashMap containing default timeout, retry, and connection pool settings.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "1200"),
            ("connect_timeout", "30"),
            ("max_retries", "20"),
            ("retry_timeout", "1200"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get the storage type as a string.
    pub fn storage_type_str(&self) -> &str {
        match self.storage_type {
            StorageType::Memory => "memory",
            StorageType::Local => "local",
            StorageType::Aws => "aws",
            StorageType::Gcs => "gcs",
        }
    }

    /// The provider family whose URL and ACL conventions apply to this configuration.
    pub fn provider(&self) -> StorageResult<Provider> {
        match self.storage_type {
            StorageType::Aws => Ok(Provider::Aws),
            StorageType::Gcs => Ok(Provider::Google),
            StorageType::Local => Ok(Provider::Local),
            StorageType::Memory => match self.get_option("mock_provider").map(|s| s.to_lowercase()) {
                None => Ok(Provider::Local),
                Some(p) => match p.as_str() {
                    "aws" | "s3" => Ok(Provider::Aws),
                    "gcs" | "gcp" | "google" => Ok(Provider::Google),
                    "local" => Ok(Provider::Local),
                    other => Err(StorageError::ConfigError(format!(
                        "Unknown mock_provider: {}",
                        other
                    ))),
                },
            },
        }
    }

    /// Region option, treating an empty string as unset.
    pub fn region(&self) -> Option<&str> {
        self.get_option("region")
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}

impl From<StorageConfig> for String {
    fn from(config: StorageConfig) -> Self {
        config.storage_type_str().to_string()
    }
}
