//! Attaching metadata to embeddings and submitting them to the index.

use std::sync::Arc;

use cadenza_core::{EmbeddingVector, TrackMetadata, VectorId};
use cadenza_embed::EmbeddingPool;

use crate::error::{SearchError, SearchResult};
use crate::index::{IndexItem, SimilarityIndex};

/// Submits embeddings with their metadata to a similarity index.
///
/// Each call issues exactly one upsert. Nothing is retried or
/// deduplicated here, so a caller retrying after a transient failure may
/// leave a duplicate entry in the index.
#[derive(Debug, Clone)]
pub struct IngestCoordinator {
    index: Arc<dyn SimilarityIndex>,
    pool: EmbeddingPool,
}

impl IngestCoordinator {
    #[must_use]
    pub fn new(index: Arc<dyn SimilarityIndex>, pool: EmbeddingPool) -> Self {
        Self { index, pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &EmbeddingPool {
        &self.pool
    }

    /// Embed `bytes` and upsert the result under `metadata`.
    ///
    /// A missing duration is filled from the decoded audio, truncated to
    /// whole seconds. The url and passthrough keys are checked before any
    /// decoding happens.
    pub async fn ingest(
        &self,
        bytes: Vec<u8>,
        mut metadata: TrackMetadata,
    ) -> SearchResult<EmbeddingVector> {
        metadata.validate_source().map_err(SearchError::from_metadata)?;

        let embedding = self.pool.embed(bytes).await?;
        if metadata.duration_secs.is_none() {
            metadata.duration_secs = Some(embedding.whole_seconds());
        }

        self.ingest_vector(&embedding.vector, &metadata).await?;
        Ok(embedding.vector)
    }

    /// Upsert an already computed embedding.
    pub async fn ingest_vector(
        &self,
        vector: &EmbeddingVector,
        metadata: &TrackMetadata,
    ) -> SearchResult<VectorId> {
        let mut ids = self.ingest_batch(std::slice::from_ref(vector), metadata).await?;
        ids.pop()
            .ok_or_else(|| SearchError::InvalidInput("nothing to ingest".to_string()))
    }

    /// Upsert several embeddings sharing one metadata map in a single
    /// request. Returns the ids assigned to each vector, in order.
    pub async fn ingest_batch(
        &self,
        vectors: &[EmbeddingVector],
        metadata: &TrackMetadata,
    ) -> SearchResult<Vec<VectorId>> {
        if vectors.is_empty() {
            return Err(SearchError::InvalidInput("nothing to ingest".to_string()));
        }
        let map = metadata.to_index_map().map_err(SearchError::from_metadata)?;

        let items: Vec<IndexItem> = vectors
            .iter()
            .map(|v| IndexItem {
                id: VectorId::new(),
                values: v.as_slice().to_vec(),
                metadata: map.clone(),
            })
            .collect();
        let ids = items.iter().map(|item| item.id).collect();

        let ack = self.index.upsert(items).await?;
        if ack.upserted_count != vectors.len() {
            log::warn!(
                "Index acknowledged {} of {} vectors for {}",
                ack.upserted_count,
                vectors.len(),
                metadata.url
            );
        }

        log::info!(
            "Ingested {} vector(s) for {} into namespace '{}'",
            vectors.len(),
            metadata.url,
            metadata.namespace
        );
        Ok(ids)
    }
}
