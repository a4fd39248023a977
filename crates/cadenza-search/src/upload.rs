//! Storing, recording and indexing a user's uploaded track.

use std::sync::Arc;

use bytes::Bytes;
use cadenza_core::schema::AssetStore;
use cadenza_core::AudioAsset;

use crate::blob::{blob_key, BlobStore};
use crate::error::{SearchError, SearchResult};
use crate::ingest::IngestCoordinator;

/// A track uploaded into one of a user's playlists.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner: String,
    pub playlist: String,
    pub file_name: String,
    /// Title to record; the file name is used when absent.
    pub title: Option<String>,
    pub bytes: Vec<u8>,
}

/// Runs the upload flow: embed, record the asset, store the blob, index.
///
/// A URL that is already recorded stops the flow with an `AlreadyExists`
/// asset error before any blob is written. If storing the blob or indexing
/// fails, the asset record is removed again so the upload can be retried.
#[derive(Debug, Clone)]
pub struct UploadCoordinator {
    blobs: Arc<dyn BlobStore>,
    assets: Arc<dyn AssetStore>,
    ingest: IngestCoordinator,
}

impl UploadCoordinator {
    #[must_use]
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        assets: Arc<dyn AssetStore>,
        ingest: IngestCoordinator,
    ) -> Self {
        Self {
            blobs,
            assets,
            ingest,
        }
    }

    pub async fn upload(&self, request: UploadRequest) -> SearchResult<AudioAsset> {
        let UploadRequest {
            owner,
            playlist,
            file_name,
            title,
            bytes,
        } = request;
        let key = blob_key(&owner, &playlist, &file_name)?;
        let url = self.blobs.url(&key)?;

        let existing = url.clone();
        if self
            .with_assets(move |assets| assets.find_by_url(&existing))
            .await?
            .is_some()
        {
            return Err(already_uploaded(url));
        }

        let bytes = Bytes::from(bytes);
        let embedding = self.ingest.pool().embed(bytes.clone()).await?;

        let asset = AudioAsset::new(
            owner,
            playlist,
            url,
            title.unwrap_or(file_name),
            embedding.whole_seconds(),
            key,
        );
        let record = asset.clone();
        self.with_assets(move |assets| assets.create(&record)).await?;

        if let Err(e) = self.blobs.put(&asset.blob_key, &bytes).await {
            self.discard(&asset).await;
            return Err(e);
        }
        if let Err(e) = self
            .ingest
            .ingest_vector(&embedding.vector, &asset.track_metadata())
            .await
        {
            self.discard(&asset).await;
            return Err(e);
        }

        log::info!(
            "Uploaded '{}' to {}/{} ({}s)",
            asset.title,
            asset.owner,
            asset.playlist,
            asset.duration_secs
        );
        Ok(asset)
    }

    /// Remove the record of an upload that did not complete.
    async fn discard(&self, asset: &AudioAsset) {
        let id = asset.id;
        if let Err(e) = self.with_assets(move |assets| assets.delete(&id)).await {
            log::warn!("Could not remove incomplete upload {}: {e}", asset.url);
        }
    }

    /// Run a store operation off the async runtime.
    async fn with_assets<T, F>(&self, op: F) -> SearchResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn AssetStore) -> cadenza_core::Result<T> + Send + 'static,
    {
        let assets = Arc::clone(&self.assets);
        let result = tokio::task::spawn_blocking(move || op(assets.as_ref()))
            .await
            .map_err(|e| {
                cadenza_core::Error::Io(std::io::Error::other(format!("task failed: {e}")))
            })?;
        Ok(result?)
    }
}

fn already_uploaded(url: String) -> SearchError {
    SearchError::Asset(cadenza_core::Error::AlreadyExists {
        entity: "audio asset",
        field: "url",
        value: url,
    })
}
