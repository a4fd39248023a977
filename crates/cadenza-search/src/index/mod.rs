//! The external similarity index, as seen by the coordinators.

pub mod pinecone;

use async_trait::async_trait;
use cadenza_core::{Namespace, SimilarityMatch, VectorId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SearchResult;

pub use pinecone::PineconeIndex;

/// One vector and its metadata, ready for upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexItem {
    pub id: VectorId,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Restricts a query to one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceFilter {
    pub namespace: Namespace,
}

impl NamespaceFilter {
    #[must_use]
    pub const fn new(namespace: Namespace) -> Self {
        Self { namespace }
    }

    /// Metadata filter expression: `{"namespace": {"$eq": <namespace>}}`.
    #[must_use]
    pub fn expression(&self) -> Value {
        json!({ "namespace": { "$eq": self.namespace.as_str() } })
    }

    /// Whether a metadata map falls inside this namespace.
    #[must_use]
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        metadata.get("namespace").and_then(Value::as_str) == Some(self.namespace.as_str())
    }
}

/// A nearest-neighbour request.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub filter: NamespaceFilter,
    pub vector: Vec<f32>,
    pub top_k: usize,
}

/// Index answer to an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAck {
    #[serde(default)]
    pub upserted_count: usize,
}

/// Index answer to a query, in the order the index returned it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<SimilarityMatch>,
}

/// Capability for talking to a similarity index.
///
/// Built once at startup and shared by reference; the coordinators never
/// construct their own client.
#[async_trait]
pub trait SimilarityIndex: Send + Sync + std::fmt::Debug {
    async fn upsert(&self, items: Vec<IndexItem>) -> SearchResult<UpsertAck>;

    async fn query(&self, query: IndexQuery) -> SearchResult<QueryResponse>;
}
