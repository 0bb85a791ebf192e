use cloud_uploads::storage::DEFAULT_MAX_AGE;
use cloud_uploads::{SourceFile, StorageAdapter, StorageConfig, UploaderConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let max_age = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u64>().unwrap())
        .unwrap_or(DEFAULT_MAX_AGE);

    let adapter = StorageAdapter::builder(StorageConfig::memory(), UploaderConfig::new("scratch"))
        .build()
        .await
        .unwrap();

    for name in ["a.txt", "b.txt", "c.txt"] {
        adapter
            .cache(SourceFile::from_bytes(name, "temporary"))
            .await
            .unwrap();
    }

    let report = adapter.clean_cached_files(Some(max_age)).await.unwrap();
    println!(
        "scanned={} deleted={} skipped={}",
        report.scanned,
        report.deleted.len(),
        report.skipped.len()
    );
}
