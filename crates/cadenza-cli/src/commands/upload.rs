use anyhow::{Context, Result};
use cadenza_core::schema::SqliteAssetStore;
use cadenza_embed::{Config, EmbeddingPool};
use cadenza_search::{FsBlobStore, IngestCoordinator, UploadCoordinator, UploadRequest};
use std::path::Path;
use std::sync::Arc;

pub async fn run_upload(
    path: &Path,
    owner: String,
    playlist: String,
    title: Option<String>,
    config: &Config,
) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", path.display()))?;
    let bytes = super::read_audio(path)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let assets = SqliteAssetStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    let blobs = FsBlobStore::new(&config.blob_dir, config.blob_base_url.clone());
    let ingest = IngestCoordinator::new(
        super::similarity_index(config)?,
        EmbeddingPool::from_config(config),
    );
    let coordinator = UploadCoordinator::new(Arc::new(blobs), Arc::new(assets), ingest);

    let asset = coordinator
        .upload(UploadRequest {
            owner,
            playlist,
            file_name,
            title,
            bytes,
        })
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;

    println!("✓ Uploaded '{}'", asset.title);
    println!("  Asset: {}", asset.id);
    println!("  URL: {}", asset.url);
    println!("  Playlist: {}/{}", asset.owner, asset.playlist);
    println!("  Duration: {}s", asset.duration_secs);

    Ok(())
}
