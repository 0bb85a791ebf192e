use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::StorageResult;
use super::provider::ObjectStoreClient;
use crate::uploader::cache_id::CacheId;
use crate::util::Clock;

/// Age after which cached files are removed when no threshold is given (one day).
pub const DEFAULT_MAX_AGE: u64 = 86_400;

/// Outcome of one [`CacheSweeper::sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of keys listed below the cache directory
    pub scanned: usize,
    /// Keys removed because they were older than the threshold
    pub deleted: Vec<String>,
    /// Keys without a parseable cache id; never deleted
    pub skipped: Vec<String>,
}

/// Removes cached files whose cache id is older than a threshold.
///
/// Age is read per key from the cache id segment right below `cache_dir`, so files sharing a
/// cache id are judged independently of their siblings. Keys whose segment does not parse as a
/// cache id in any known format are left alone.
#[derive(Debug, Clone)]
pub struct CacheSweeper {
    client: Arc<dyn ObjectStoreClient>,
    cache_dir: String,
    clock: Arc<dyn Clock>,
}

impl CacheSweeper {
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        cache_dir: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into().trim_end_matches('/').to_string(),
            clock,
        }
    }

    fn cache_id_of(&self, key: &str) -> Option<CacheId> {
        let relative = if self.cache_dir.is_empty() {
            key
        } else {
            key.strip_prefix(&self.cache_dir)?.strip_prefix('/')?
        };
        let segment = relative.split('/').next()?;
        match CacheId::parse(segment) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Skipping key={}: {}", key, e);
                None
            }
        }
    }

    /// Delete every cached file older than `max_age` seconds ([`DEFAULT_MAX_AGE`] if `None`).
    ///
    /// # Errors
    ///
    /// Listing and delete failures are returned; unparseable keys never are.
    pub async fn sweep(&self, max_age: Option<u64>) -> StorageResult<SweepReport> {
        let max_age_secs = max_age.unwrap_or(DEFAULT_MAX_AGE);
        let max_age = i64::try_from(max_age_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        let now = self.clock.now();

        let keys = self
            .client
            .list_by_prefix(&format!("{}/", self.cache_dir))
            .await?;

        let mut report = SweepReport {
            scanned: keys.len(),
            ..Default::default()
        };
        for key in keys {
            let Some(cache_id) = self.cache_id_of(&key) else {
                report.skipped.push(key);
                continue;
            };
            if now - cache_id.created_at() > max_age {
                self.client.delete(&key).await?;
                report.deleted.push(key);
            }
        }

        info!(
            "Swept cache_dir={} max_age={}s scanned={} deleted={} skipped={}",
            self.cache_dir,
            max_age_secs,
            report.scanned,
            report.deleted.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
