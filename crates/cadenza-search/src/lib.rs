//! Ingestion and query coordination for cadenza.
//!
//! The coordinators take their external collaborators (similarity index,
//! remote fetch, blob and asset stores) as shared capabilities built once
//! at startup, so tests can substitute in-memory doubles.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod blob;
pub mod error;
pub mod fetch;
pub mod index;
pub mod ingest;
pub mod query;
pub mod upload;

pub use blob::{blob_key, BlobStore, FsBlobStore};
pub use error::{ErrorReport, SearchError, SearchResult};
pub use fetch::{HttpFetcher, RemoteFetch};
pub use index::{
    IndexItem, IndexQuery, NamespaceFilter, PineconeIndex, QueryResponse, SimilarityIndex,
    UpsertAck,
};
pub use ingest::IngestCoordinator;
pub use query::{rank_matches, QueryCoordinator, QuerySource, DEFAULT_TOP_K};
pub use upload::{UploadCoordinator, UploadRequest};
