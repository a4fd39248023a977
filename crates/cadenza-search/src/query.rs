//! Nearest-neighbour lookup for query audio.

use std::sync::Arc;

use cadenza_core::{Namespace, SimilarityMatch};
use cadenza_embed::EmbeddingPool;

use crate::error::{SearchError, SearchResult};
use crate::fetch::RemoteFetch;
use crate::index::{IndexQuery, NamespaceFilter, SimilarityIndex};

/// Number of matches returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 10;

/// Where the query audio comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    Bytes(Vec<u8>),
    Url(String),
}

/// Embeds query audio and asks the index for its nearest neighbours.
#[derive(Debug, Clone)]
pub struct QueryCoordinator {
    index: Arc<dyn SimilarityIndex>,
    pool: EmbeddingPool,
    fetcher: Arc<dyn RemoteFetch>,
}

impl QueryCoordinator {
    #[must_use]
    pub fn new(
        index: Arc<dyn SimilarityIndex>,
        pool: EmbeddingPool,
        fetcher: Arc<dyn RemoteFetch>,
    ) -> Self {
        Self {
            index,
            pool,
            fetcher,
        }
    }

    /// Return at most `top_k` matches within `namespace`, best first.
    ///
    /// Scores are taken from the index as-is. The result is re-sorted by
    /// descending score because the index does not promise an order; equal
    /// scores keep the order the index returned them in.
    pub async fn query(
        &self,
        source: QuerySource,
        namespace: &Namespace,
        top_k: usize,
    ) -> SearchResult<Vec<SimilarityMatch>> {
        if top_k == 0 {
            return Err(SearchError::InvalidInput("top_k must be at least 1".to_string()));
        }

        let bytes = match source {
            QuerySource::Bytes(bytes) => bytes,
            QuerySource::Url(url) => self.fetcher.fetch(&url).await?,
        };
        let embedding = self.pool.embed(bytes).await?;

        let response = self
            .index
            .query(IndexQuery {
                filter: NamespaceFilter::new(namespace.clone()),
                vector: embedding.vector.into_inner(),
                top_k,
            })
            .await?;

        let matches = rank_matches(response.matches, top_k);
        log::info!(
            "Query in namespace '{namespace}' returned {} match(es)",
            matches.len()
        );
        Ok(matches)
    }
}

/// Stable sort by descending score, truncated to `top_k`.
#[must_use]
pub fn rank_matches(mut matches: Vec<SimilarityMatch>, top_k: usize) -> Vec<SimilarityMatch> {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);
    matches
}
