use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use super::error::{StorageError, StorageResult};
use super::provider::ObjectStoreClient;
use super::url::UrlGenerator;
use crate::uploader::UploaderConfig;
use crate::util::Clock;

/// Directory handle shared by the adapter and every [`RemoteFile`](super::RemoteFile) it hands out.
#[derive(Debug)]
pub(crate) struct Bucket {
    pub(crate) client: Arc<dyn ObjectStoreClient>,
    pub(crate) uploader: UploaderConfig,
    pub(crate) urls: UrlGenerator,
    pub(crate) clock: Arc<dyn Clock>,
    created: OnceCell<()>,
}

impl Bucket {
    pub(crate) fn new(
        client: Arc<dyn ObjectStoreClient>,
        uploader: UploaderConfig,
        urls: UrlGenerator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            uploader,
            urls,
            clock,
            created: OnceCell::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.uploader.directory
    }

    /// Create the directory on first use. A failed attempt is retried by the next write.
    pub(crate) async fn ensure_created(&self) -> StorageResult<()> {
        self.created
            .get_or_try_init(|| async {
                self.client
                    .create_bucket(self.name(), self.uploader.public)
                    .await?;
                info!("Using directory={} public={}", self.name(), self.uploader.public);
                Ok::<(), StorageError>(())
            })
            .await
            .map(|_| ())
    }
}
