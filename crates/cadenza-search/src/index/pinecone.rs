//! HTTP client for a Pinecone-compatible similarity index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{IndexItem, IndexQuery, QueryResponse, SimilarityIndex, UpsertAck};
use crate::error::{SearchError, SearchResult};

/// Similarity index reached over the Pinecone data-plane REST API.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PineconeIndex {
    /// Create a client for the index served at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cadenza/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> SearchResult<T> {
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if let Some(ref key) = self.api_key {
            request = request.header("Api-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            SearchError::retrieval(format!("index request to {path} failed: {e}"), !e.is_builder())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchError::retrieval(
                format!("index answered {status} to {path}: {}", detail.trim()),
                is_transient_status(status),
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            SearchError::retrieval(format!("failed to read index response: {e}"), true)
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            SearchError::retrieval(format!("malformed index response from {path}: {e}"), false)
        })
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn upsert_body(items: &[IndexItem]) -> Value {
    json!({ "vectors": items })
}

fn query_body(query: &IndexQuery) -> Value {
    json!({
        "vector": query.vector,
        "topK": query.top_k,
        "filter": query.filter.expression(),
        "includeMetadata": true,
        "includeValues": false,
    })
}

/// Reject matches whose score is not a finite number.
fn check_scores(response: QueryResponse) -> SearchResult<QueryResponse> {
    if let Some(bad) = response.matches.iter().find(|m| !m.score.is_finite()) {
        return Err(SearchError::retrieval(
            format!("malformed index response: non-finite score {}", bad.score),
            false,
        ));
    }
    Ok(response)
}

#[async_trait]
impl SimilarityIndex for PineconeIndex {
    async fn upsert(&self, items: Vec<IndexItem>) -> SearchResult<UpsertAck> {
        let ack: UpsertAck = self.post("vectors/upsert", &upsert_body(&items)).await?;
        log::debug!("Index acknowledged {} upserted vectors", ack.upserted_count);
        Ok(ack)
    }

    async fn query(&self, query: IndexQuery) -> SearchResult<QueryResponse> {
        let response: QueryResponse = self.post("query", &query_body(&query)).await?;
        check_scores(response)
    }
}
