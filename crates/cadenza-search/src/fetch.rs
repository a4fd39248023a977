//! Retrieval of query audio from a remote address.

use std::time::Duration;

use async_trait::async_trait;
use cadenza_embed::EmbedError;
use reqwest::Client;

use crate::error::{SearchError, SearchResult};

/// Capability for downloading the raw bytes behind a URL.
#[async_trait]
pub trait RemoteFetch: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, url: &str) -> SearchResult<Vec<u8>>;
}

/// [`RemoteFetch`] over HTTP(S) with a hard size ceiling.
///
/// The ceiling is enforced on the advertised `Content-Length` and again
/// while the body streams in, so an oversized download is abandoned
/// without being buffered whole.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(max_bytes: u64, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cadenza/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, max_bytes })
    }

    fn too_large(&self, size: u64) -> SearchError {
        SearchError::Embed(EmbedError::InputTooLarge(format!(
            "remote audio is {size} bytes, limit is {}",
            self.max_bytes
        )))
    }
}

#[async_trait]
impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> SearchResult<Vec<u8>> {
        log::debug!("Fetching query audio from {url}");

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SearchError::fetch(url, e.to_string()))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(self.too_large(len));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SearchError::fetch(url, e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_bytes {
                return Err(self.too_large(body.len() as u64));
            }
        }

        if body.is_empty() {
            return Err(SearchError::fetch(url, "empty response body"));
        }

        log::debug!("Fetched {} bytes from {url}", body.len());
        Ok(body)
    }
}
