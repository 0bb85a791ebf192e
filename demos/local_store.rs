use cloud_uploads::{SourceFile, StorageAdapter, StorageConfig, UploaderConfig, UrlOptions};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let root = std::env::temp_dir().join("cloud-uploads-demo");
    std::fs::create_dir_all(&root).unwrap();

    let storage_config = StorageConfig::local().with_option("path", root.to_str().unwrap());
    let uploader = UploaderConfig::new("assets").with_attribute("Cache-Control", "max-age=3600");
    let adapter = StorageAdapter::builder(storage_config, uploader)
        .build()
        .await
        .unwrap();

    // Cache, then promote
    let cached = adapter
        .cache(SourceFile::from_bytes("hello.txt", "hello world").with_content_type("text/plain"))
        .await
        .unwrap();
    println!("cached at {}", cached.path());

    let mut stored = adapter.store(SourceFile::Remote(cached)).await.unwrap();
    println!("stored at {}", stored.path());
    println!("public url {}", stored.public_url());
    println!("signed url {:?}", stored.url(&UrlOptions::new()).await.unwrap());
    println!("size {:?}", stored.size().await);

    let body = stored.read().await.unwrap();
    println!("{}", String::from_utf8_lossy(&body));
}
