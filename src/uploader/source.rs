use bytes::Bytes;
use std::fmt::{Debug, Formatter};
use std::io;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::RemoteFile;

/// A file handed to the adapter for caching or storing.
pub enum SourceFile {
    /// Bytes already in memory
    Bytes {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
    /// A file on local disk
    Path {
        path: PathBuf,
        content_type: Option<String>,
    },
    /// A single-use stream, read to the end exactly once
    Reader {
        filename: String,
        content_type: Option<String>,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    },
    /// An object already in the directory; re-stored with a server-side copy
    Remote(RemoteFile),
}

/// Body and metadata of a non-remote source, after reading it.
#[derive(Debug, Clone)]
pub(crate) struct LoadedFile {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl SourceFile {
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        SourceFile::Bytes {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        SourceFile::Path {
            path: path.into(),
            content_type: None,
        }
    }

    pub fn from_reader<R>(filename: impl Into<String>, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        SourceFile::Reader {
            filename: filename.into(),
            content_type: None,
            reader: Box::new(reader),
        }
    }

    /// Set an explicit content type. Ignored for [`SourceFile::Remote`], which keeps its own.
    pub fn with_content_type(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            SourceFile::Bytes { content_type, .. }
            | SourceFile::Path { content_type, .. }
            | SourceFile::Reader { content_type, .. } => *content_type = Some(value.into()),
            SourceFile::Remote(_) => {}
        }
        self
    }

    /// Last path segment of the source, used to build store and cache keys.
    pub fn filename(&self) -> Option<String> {
        match self {
            SourceFile::Bytes { filename, .. } | SourceFile::Reader { filename, .. } => {
                Some(filename.clone()).filter(|f| !f.is_empty())
            }
            SourceFile::Path { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string()),
            SourceFile::Remote(file) => Some(file.filename()).filter(|f| !f.is_empty()),
        }
    }

    /// Filename of the source, or an [`StorageError::UploadError`] against `target` when it
    /// has none.
    pub(crate) fn require_filename(&self, target: &str) -> StorageResult<String> {
        self.filename().ok_or_else(|| {
            StorageError::upload(
                target,
                io::Error::new(io::ErrorKind::InvalidInput, "source file has no filename"),
            )
        })
    }

    /// Read the whole body into memory for a write to `key`. Remote sources are rejected;
    /// copy them instead.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UploadError`] for `key` when the source cannot be read.
    pub(crate) async fn load(self, key: &str) -> StorageResult<LoadedFile> {
        match self {
            SourceFile::Bytes {
                content_type, data, ..
            } => Ok(LoadedFile {
                content_type,
                body: data,
            }),
            SourceFile::Path { path, content_type } => {
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|e| StorageError::upload(key, e))?;
                Ok(LoadedFile {
                    content_type,
                    body: Bytes::from(data),
                })
            }
            SourceFile::Reader {
                content_type,
                mut reader,
                ..
            } => {
                let mut data = Vec::new();
                reader
                    .read_to_end(&mut data)
                    .await
                    .map_err(|e| StorageError::upload(key, e))?;
                Ok(LoadedFile {
                    content_type,
                    body: Bytes::from(data),
                })
            }
            SourceFile::Remote(file) => Err(StorageError::upload(
                key,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("remote file '{}' must be copied, not read", file.path()),
                ),
            )),
        }
    }
}

impl Debug for SourceFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFile::Bytes {
                filename,
                content_type,
                data,
            } => write!(
                f,
                "SourceFile::Bytes(filename={}, content_type={:?}, len={})",
                filename,
                content_type,
                data.len()
            ),
            SourceFile::Path { path, content_type } => write!(
                f,
                "SourceFile::Path(path={}, content_type={:?})",
                path.display(),
                content_type
            ),
            SourceFile::Reader {
                filename,
                content_type,
                ..
            } => write!(
                f,
                "SourceFile::Reader(filename={}, content_type={:?})",
                filename, content_type
            ),
            SourceFile::Remote(file) => write!(f, "SourceFile::Remote(key={})", file.path()),
        }
    }
}
