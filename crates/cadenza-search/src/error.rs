//! Error types for ingestion and query coordination.

use cadenza_embed::EmbedError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the search coordinators.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding the audio failed. Passed through unchanged.
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// The similarity index was unreachable or answered with something
    /// unusable.
    #[error("retrieval error: {message}")]
    Retrieval { message: String, transient: bool },

    /// Downloading query audio failed.
    #[error("upstream fetch error from {url}: {message}")]
    UpstreamFetch { url: String, message: String },

    /// Metadata, namespace or query parameters failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Writing raw audio to the blob store failed.
    #[error("blob store error: {0}")]
    Blob(String),

    /// The asset store rejected or failed an operation.
    #[error("asset store error: {0}")]
    Asset(#[from] cadenza_core::Error),
}

impl SearchError {
    pub(crate) fn retrieval(message: impl Into<String>, transient: bool) -> Self {
        Self::Retrieval {
            message: message.into(),
            transient,
        }
    }

    pub(crate) fn fetch(url: &str, message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Metadata rejections are caller mistakes, not store failures.
    pub(crate) fn from_metadata(err: cadenza_core::Error) -> Self {
        match err {
            cadenza_core::Error::InvalidData(message) => Self::InvalidInput(message),
            other => Self::Asset(other),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Embed(e) => e.kind(),
            Self::Retrieval { .. } => "retrieval",
            Self::UpstreamFetch { .. } => "upstream_fetch",
            Self::InvalidInput(_) => "invalid_input",
            Self::Blob(_) => "blob",
            Self::Asset(_) => "asset",
        }
    }

    /// Returns `true` when the operation may succeed if retried.
    ///
    /// Nothing in this crate retries; this is for callers that do.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Retrieval { transient, .. } => *transient,
            Self::Embed(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Structured form for boundary responses.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Error kind plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
}

/// Convenience alias for search results.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
