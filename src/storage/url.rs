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

//! Public and authenticated URL generation.
//!
//! Provider differences (host style, ACL syntax, signing support) live in [`ProviderUrls`],
//! chosen once when the adapter is built.

use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::config::{Provider, StorageConfig};
use super::error::{StorageError, StorageResult};
use super::provider::{ObjectAttributes, ObjectStoreClient, SignRequest};
use super::RemoteFile;
use crate::uploader::{AssetHost, UploaderConfig};
use crate::util::Clock;

/// RFC 3986 unreserved characters stay as-is, everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const AWS_DEFAULT_REGION: &str = "us-east-1";

pub(crate) fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

/// Percent-encode every segment of a key, keeping the `/` separators.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a local filesystem path into a `file:///` URI.
pub(crate) fn file_uri(path: &str) -> String {
    // Backslashes and the Windows extended-length prefix come from canonicalize()
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("//?/").unwrap_or(&path).to_string();

    let path_without_scheme = if let Some(without_scheme) = path.strip_prefix("file:") {
        without_scheme.trim_start_matches('/').to_string()
    } else {
        path.trim_start_matches('/').to_string()
    };

    format!("file:///{}", path_without_scheme)
}

/// Whether `bucket` can be used as a DNS label in front of the S3 host.
///
/// 3 to 63 characters of `[a-z0-9.-]`, starting and ending alphanumeric, no `..`, `.-`
/// or `-.`, and not shaped like an IPv4 address.
pub fn is_virtual_host_safe(bucket: &str) -> bool {
    let bytes = bucket.as_bytes();
    if !(3..=63).contains(&bytes.len()) {
        return false;
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'.' || *b == b'-')
    {
        return false;
    }
    if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }
    if bucket.contains("..") || bucket.contains(".-") || bucket.contains("-.") {
        return false;
    }
    let labels: Vec<&str> = bucket.split('.').collect();
    let looks_like_ip = labels.len() == 4
        && labels
            .iter()
            .all(|l| (1..=3).contains(&l.len()) && l.bytes().all(|b| b.is_ascii_digit()));
    !looks_like_ip
}

/// S3 host selection inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsUrls {
    pub region: Option<String>,
    pub use_ssl: bool,
    pub accelerate: bool,
    /// Custom service endpoint (S3-compatible stores); always path style
    pub endpoint: Option<String>,
}

impl AwsUrls {
    fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    fn service_host(&self) -> String {
        match self.region.as_deref() {
            None | Some("") | Some(AWS_DEFAULT_REGION) => "s3.amazonaws.com".to_string(),
            Some(region) => format!("s3.{}.amazonaws.com", region),
        }
    }

    fn object_url(&self, directory: &str, encoded_path: &str) -> String {
        if let Some(endpoint) = &self.endpoint {
            return format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                directory,
                encoded_path
            );
        }

        let scheme = self.scheme();
        if self.accelerate {
            return format!(
                "{}://{}.s3-accelerate.amazonaws.com/{}",
                scheme, directory, encoded_path
            );
        }

        // Wildcard certificates do not cover dotted bucket names
        let virtual_hosted =
            is_virtual_host_safe(directory) && !(self.use_ssl && directory.contains('.'));
        let host = self.service_host();
        if virtual_hosted {
            format!("{}://{}.{}/{}", scheme, directory, host, encoded_path)
        } else {
            format!("{}://{}/{}/{}", scheme, host, directory, encoded_path)
        }
    }
}

/// Provider-specific URL and ACL conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderUrls {
    Aws(AwsUrls),
    Google,
    /// Objects addressed below `root` (a `file:///` URI or a custom endpoint); never signed
    Local { root: String },
}

impl ProviderUrls {
    /// Select conventions from the storage and uploader configuration.
    ///
    /// `local_root` is the canonical root of a local backend, if any.
    pub fn from_config(
        storage: &StorageConfig,
        uploader: &UploaderConfig,
        local_root: Option<&str>,
    ) -> StorageResult<Self> {
        let endpoint = storage.get_option("endpoint").cloned();
        Ok(match storage.provider()? {
            Provider::Aws => ProviderUrls::Aws(AwsUrls {
                region: storage.region().map(|r| r.to_string()),
                use_ssl: uploader.use_ssl_for_aws,
                accelerate: uploader.aws_accelerate,
                endpoint,
            }),
            Provider::Google => ProviderUrls::Google,
            Provider::Local => ProviderUrls::Local {
                root: endpoint
                    .or_else(|| local_root.map(file_uri))
                    .unwrap_or_else(|| "memory://".to_string()),
            },
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderUrls::Aws(_) => Provider::Aws,
            ProviderUrls::Google => Provider::Google,
            ProviderUrls::Local { .. } => Provider::Local,
        }
    }

    /// Unsigned URL of `key` inside `directory`.
    pub fn object_url(&self, directory: &str, key: &str) -> String {
        let encoded_path = encode_path(key);
        match self {
            ProviderUrls::Aws(aws) => aws.object_url(directory, &encoded_path),
            ProviderUrls::Google => format!(
                "https://storage.googleapis.com/{}/{}",
                directory, encoded_path
            ),
            ProviderUrls::Local { root } => {
                if root.ends_with('/') {
                    format!("{}{}/{}", root, directory, encoded_path)
                } else {
                    format!("{}/{}/{}", root, directory, encoded_path)
                }
            }
        }
    }

    /// Header granting public read access, in the provider's syntax.
    pub fn acl_header(&self, public: bool) -> Option<(&'static str, &'static str)> {
        if !public {
            return None;
        }
        match self {
            ProviderUrls::Aws(_) => Some(("x-amz-acl", "public-read")),
            ProviderUrls::Google => Some(("destination_predefined_acl", "publicRead")),
            ProviderUrls::Local { .. } => None,
        }
    }

    pub fn supports_signing(&self) -> bool {
        !matches!(self, ProviderUrls::Local { .. })
    }
}

/// Options for [`RemoteFile::url`] and [`RemoteFile::authenticated_url`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Absolute expiry, overriding the configured lifetime
    pub expire_at: Option<DateTime<Utc>>,

    /// Provider query parameters, e.g. `response-content-disposition`
    pub query: BTreeMap<String, String>,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Builds URLs for files of one uploader.
#[derive(Debug, Clone)]
pub struct UrlGenerator {
    urls: ProviderUrls,
    directory: String,
    public: bool,
    asset_host: Option<AssetHost>,
    expiration: u64,
    clock: Arc<dyn Clock>,
}

impl UrlGenerator {
    pub fn new(urls: ProviderUrls, uploader: &UploaderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            urls,
            directory: uploader.directory.clone(),
            public: uploader.public,
            asset_host: uploader.asset_host.clone(),
            expiration: uploader.authenticated_url_expiration,
            clock,
        }
    }

    pub fn urls(&self) -> &ProviderUrls {
        &self.urls
    }

    /// Public URL of `file`; a configured asset host wins over the provider host.
    pub fn public_url(&self, file: &RemoteFile) -> String {
        if let Some(asset_host) = &self.asset_host {
            let host = asset_host.resolve(file);
            return format!(
                "{}/{}",
                host.trim_end_matches('/'),
                encode_path(file.path())
            );
        }
        self.urls.object_url(&self.directory, file.path())
    }

    /// Expiry of a signed URL issued at `now`, `None` if the configured lifetime overflows.
    ///
    /// Computed on absolute instants so a DST change in between never shifts the result.
    pub fn expires_at(&self, now: DateTime<Utc>, options: &UrlOptions) -> Option<DateTime<Utc>> {
        if let Some(expire_at) = options.expire_at {
            return Some(expire_at);
        }
        i64::try_from(self.expiration)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
    }

    /// Signed URL of `key`, `None` when the provider does not sign. Never fetches the object.
    pub async fn authenticated_url(
        &self,
        client: &dyn ObjectStoreClient,
        key: &str,
        options: &UrlOptions,
    ) -> StorageResult<Option<String>> {
        if !self.urls.supports_signing() {
            debug!(
                "provider={} cannot sign urls, key={}",
                self.urls.provider().name(),
                key
            );
            return Ok(None);
        }

        let signed_at = self.clock.now();
        let expires_at =
            self.expires_at(signed_at, options)
                .ok_or_else(|| StorageError::SignatureError {
                    key: key.to_string(),
                    reason: format!("expiration of {}s is out of range", self.expiration),
                })?;
        let request = SignRequest {
            key: key.to_string(),
            url: Url::parse(&self.urls.object_url(&self.directory, key))?,
            signed_at,
            expires_at,
            query: options.query.clone(),
        };
        debug!(
            "Signing url for key={} expires_at={}",
            key, request.expires_at
        );
        client.sign(&request).await
    }

    /// Public URL for public uploaders, signed URL otherwise.
    pub async fn url(
        &self,
        client: &dyn ObjectStoreClient,
        file: &RemoteFile,
        options: &UrlOptions,
    ) -> StorageResult<Option<String>> {
        if self.public {
            Ok(Some(self.public_url(file)))
        } else {
            self.authenticated_url(client, file.path(), options).await
        }
    }

    /// Attributes for a write or copy: ACL header, content type, then custom attributes.
    ///
    /// Custom attributes are merged last and only replace entries with the same key.
    pub fn write_attributes(
        &self,
        content_type: Option<&str>,
        custom: &BTreeMap<String, String>,
    ) -> ObjectAttributes {
        let mut attributes = ObjectAttributes::new();
        if let Some((name, value)) = self.urls.acl_header(self.public) {
            attributes.insert(name.to_string(), value.to_string());
        }
        if let Some(content_type) = content_type {
            attributes.insert("Content-Type".to_string(), content_type.to_string());
        }
        attributes.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
        attributes
    }
}
