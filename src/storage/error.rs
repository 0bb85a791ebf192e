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

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The object behind `key` does not exist.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Writing `key` failed. Never retried.
    #[error("Upload of '{key}' failed: {source}")]
    UploadError {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A non-write request (get, head, delete, copy, list) failed for `key`.
    #[error("Failed to {operation} '{key}': {source}")]
    RequestError {
        operation: &'static str,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Cannot sign URL for '{key}': {reason}")]
    SignatureError { key: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

impl StorageError {
    /// Wrap a backend error for a request against `key`, turning a missing object into
    /// [`StorageError::NotFound`].
    pub(crate) fn request(operation: &'static str, key: &str, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                key: key.to_string(),
            },
            source => StorageError::RequestError {
                operation,
                key: key.to_string(),
                source,
            },
        }
    }

    pub(crate) fn upload(key: &str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StorageError::UploadError {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Whether the failure looks like a dropped or stalled connection worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::ConnectionError(_) => true,
            StorageError::IoError(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
            ),
            StorageError::RequestError { source, .. } | StorageError::ObjectStoreError(source) => {
                let msg = format!("{:?}", source);
                msg.contains("ConnectionReset")
                    || msg.contains("BrokenPipe")
                    || msg.contains("Interrupted")
                    || msg.contains("TimedOut")
            }
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error() {
        let error = StorageError::ConfigError("Invalid configuration".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_not_found_names_key() {
        let error = StorageError::NotFound {
            key: "uploads/test.jpg".to_string(),
        };
        assert_eq!(error.to_string(), "Object not found: uploads/test.jpg");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_request_maps_not_found() {
        let source = object_store::Error::NotFound {
            path: "uploads/test.jpg".to_string(),
            source: "missing".into(),
        };
        let error = StorageError::request("delete", "uploads/test.jpg", source);
        assert!(error.is_not_found());
    }

    #[test]
    fn test_request_keeps_operation_and_key() {
        let source = object_store::Error::Generic {
            store: "memory",
            source: "boom".into(),
        };
        let error = StorageError::request("copy", "uploads/a.jpg", source);
        let msg = error.to_string();
        assert!(msg.contains("copy"));
        assert!(msg.contains("uploads/a.jpg"));
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_upload_error_source() {
        let error = StorageError::upload("uploads/a.jpg", io::Error::other("disk full"));
        assert!(error.to_string().contains("uploads/a.jpg"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_signature_error() {
        let error = StorageError::SignatureError {
            key: "uploads/a.jpg".to_string(),
            reason: "expiry too long".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot sign URL for 'uploads/a.jpg': expiry too long"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let storage_error: StorageError = io_error.into();

        match storage_error {
            StorageError::IoError(_) => {
                assert!(storage_error.to_string().contains("IO error"));
            }
            _ => panic!("Expected IoError variant"),
        }
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let url_error = url::ParseError::EmptyHost;
        let storage_error: StorageError = url_error.into();
        assert!(storage_error.to_string().contains("URL parse error"));
    }

    #[test]
    fn test_is_transient() {
        assert!(StorageError::ConnectionError("reset".to_string()).is_transient());
        assert!(StorageError::IoError(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_transient());
        assert!(!StorageError::IoError(io::Error::new(io::ErrorKind::NotFound, "x")).is_transient());
        assert!(!StorageError::ConfigError("bad".to_string()).is_transient());
        assert!(!StorageError::NotFound {
            key: "k".to_string()
        }
        .is_transient());
    }
}
