//! Uploader-side inputs to the storage layer
//!
//! The storage adapter only reads these: path resolution, public/ssl flags, custom
//! attributes, URL expiry, the asset host, cache ids and the files being uploaded.

pub mod cache_id;
pub mod config;
pub mod source;

pub use cache_id::{CacheId, CacheIdFormat};
pub use config::{AssetHost, UploaderConfig, UrlExpiration};
pub use source::SourceFile;
