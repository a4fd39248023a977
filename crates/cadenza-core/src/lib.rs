//! Core domain model for cadenza.
//!
//! This crate defines the embedding and metadata types shared by the
//! embedding pipeline and the search coordinators, the `AudioAsset` record
//! produced by the upload flow, and the SQLite schema backing the asset
//! store.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
pub use model::{
    AssetId, AudioAsset, EmbeddingVector, MetadataKey, Namespace, SimilarityMatch,
    TrackMetadata, VectorId, EMBEDDING_DIM,
};
