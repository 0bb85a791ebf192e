use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::storage::RemoteFile;

/// Default lifetime of an authenticated URL, in seconds.
pub const DEFAULT_AUTHENTICATED_URL_EXPIRATION: u64 = 600;

/// Host that replaces the provider host in public URLs.
#[derive(Clone)]
pub enum AssetHost {
    /// Fixed host such as `https://cdn.example.com`
    Static(String),
    /// Host computed from the file being rendered
    Dynamic(Arc<dyn Fn(&RemoteFile) -> String + Send + Sync>),
}

impl AssetHost {
    pub fn resolve(&self, file: &RemoteFile) -> String {
        match self {
            AssetHost::Static(host) => host.clone(),
            AssetHost::Dynamic(f) => f(file),
        }
    }
}

impl Debug for AssetHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetHost::Static(host) => write!(f, "AssetHost::Static({})", host),
            AssetHost::Dynamic(_) => write!(f, "AssetHost::Dynamic(<fn>)"),
        }
    }
}

/// Lifetime of an authenticated URL, normalised to whole seconds.
///
/// Accepts a number of seconds or a duration value so both spellings mean the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UrlExpiration(u64);

impl UrlExpiration {
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UrlExpiration {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl From<std::time::Duration> for UrlExpiration {
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_secs())
    }
}

impl From<chrono::Duration> for UrlExpiration {
    fn from(d: chrono::Duration) -> Self {
        Self(d.num_seconds().max(0) as u64)
    }
}

/// Per-uploader settings the storage adapter reads but never changes.
///
/// ```
/// use cloud_uploads::uploader::UploaderConfig;
///
/// let uploader = UploaderConfig::new("media-assets")
///     .with_public(false)
///     .with_authenticated_url_expiration(std::time::Duration::from_secs(3600))
///     .with_attribute("x-amz-server-side-encryption", "AES256");
///
/// assert_eq!(uploader.store_path("avatar.png"), "uploads/avatar.png");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Directory (bucket) holding every object of this uploader
    pub directory: String,

    /// Prefix for stored files
    pub store_dir: String,

    /// Prefix for cached files; the sweeper only looks below it
    pub cache_dir: String,

    /// Write objects world-readable and hand out public URLs
    pub public: bool,

    /// Use `https` for AWS public URLs
    pub use_ssl_for_aws: bool,

    /// Use the S3 transfer acceleration endpoint
    pub aws_accelerate: bool,

    /// Custom attributes sent with every write and copy
    pub attributes: BTreeMap<String, String>,

    /// Lifetime of authenticated URLs, in seconds
    pub authenticated_url_expiration: u64,

    #[serde(skip)]
    pub asset_host: Option<AssetHost>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            directory: String::new(),
            store_dir: "uploads".to_string(),
            cache_dir: "uploads/tmp".to_string(),
            public: true,
            use_ssl_for_aws: true,
            aws_accelerate: false,
            attributes: BTreeMap::new(),
            authenticated_url_expiration: DEFAULT_AUTHENTICATED_URL_EXPIRATION,
            asset_host: None,
        }
    }
}

impl Debug for UploaderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("directory", &self.directory)
            .field("store_dir", &self.store_dir)
            .field("cache_dir", &self.cache_dir)
            .field("public", &self.public)
            .field("use_ssl_for_aws", &self.use_ssl_for_aws)
            .field("aws_accelerate", &self.aws_accelerate)
            .field("attributes", &self.attributes)
            .field("authenticated_url_expiration", &self.authenticated_url_expiration)
            .field("asset_host", &self.asset_host)
            .finish()
    }
}

impl UploaderConfig {
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_store_dir(mut self, dir: impl Into<String>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<String>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_ssl_for_aws(mut self, use_ssl: bool) -> Self {
        self.use_ssl_for_aws = use_ssl;
        self
    }

    pub fn with_aws_accelerate(mut self, accelerate: bool) -> Self {
        self.aws_accelerate = accelerate;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_authenticated_url_expiration(mut self, expiration: impl Into<UrlExpiration>) -> Self {
        self.authenticated_url_expiration = expiration.into().as_secs();
        self
    }

    pub fn with_asset_host(mut self, host: impl Into<String>) -> Self {
        self.asset_host = Some(AssetHost::Static(host.into()));
        self
    }

    pub fn with_asset_host_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&RemoteFile) -> String + Send + Sync + 'static,
    {
        self.asset_host = Some(AssetHost::Dynamic(Arc::new(f)));
        self
    }

    /// Key of a stored file.
    pub fn store_path(&self, identifier: &str) -> String {
        join_key(&self.store_dir, identifier)
    }

    /// Key of a cached file; `identifier` is `<cache-id>/<filename>`.
    pub fn cache_path(&self, identifier: &str) -> String {
        join_key(&self.cache_dir, identifier)
    }
}

fn join_key(dir: &str, identifier: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let identifier = identifier.trim_start_matches('/');
    if dir.is_empty() {
        identifier.to_string()
    } else {
        format!("{}/{}", dir, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UploaderConfig::new("bucket");
        assert_eq!(config.directory, "bucket");
        assert!(config.public);
        assert!(config.use_ssl_for_aws);
        assert!(!config.aws_accelerate);
        assert_eq!(config.authenticated_url_expiration, 600);
        assert!(config.asset_host.is_none());
    }

    #[test]
    fn test_paths() {
        let config = UploaderConfig::new("bucket");
        assert_eq!(config.store_path("test.jpg"), "uploads/test.jpg");
        assert_eq!(
            config.cache_path("1369894322-345-1234-2255/test.jpg"),
            "uploads/tmp/1369894322-345-1234-2255/test.jpg"
        );

        let config = config.with_store_dir("files/").with_cache_dir("");
        assert_eq!(config.store_path("/a.png"), "files/a.png");
        assert_eq!(config.cache_path("a.png"), "a.png");
    }

    #[test]
    fn test_expiration_normalises_to_seconds() {
        let week = 7 * 24 * 60 * 60;
        let from_secs = UploaderConfig::new("b").with_authenticated_url_expiration(week);
        let from_std = UploaderConfig::new("b")
            .with_authenticated_url_expiration(std::time::Duration::from_secs(week));
        let from_chrono =
            UploaderConfig::new("b").with_authenticated_url_expiration(chrono::Duration::weeks(1));

        assert_eq!(from_secs.authenticated_url_expiration, 604_800);
        assert_eq!(from_std.authenticated_url_expiration, 604_800);
        assert_eq!(from_chrono.authenticated_url_expiration, 604_800);
        assert_eq!(UrlExpiration::from(chrono::Duration::seconds(-5)).as_secs(), 0);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"directory":"assets","public":false,"attributes":{"Cache-Control":"max-age=60"}}"#;
        let config: UploaderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.directory, "assets");
        assert!(!config.public);
        assert_eq!(config.cache_dir, "uploads/tmp");
        assert_eq!(
            config.attributes.get("Cache-Control"),
            Some(&"max-age=60".to_string())
        );
    }

    #[test]
    fn test_debug_hides_callback() {
        let config = UploaderConfig::new("b").with_asset_host_fn(|_| "http://cdn".to_string());
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("AssetHost::Dynamic(<fn>)"));
    }
}
