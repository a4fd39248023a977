//! Storage for raw uploaded audio.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{SearchError, SearchResult};

/// Capability for persisting raw audio and handing back its address.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// The URL `key` is (or will be) retrievable at, without touching storage.
    fn url(&self, key: &str) -> SearchResult<String>;

    /// Store `bytes` under `key`, returning the same URL as [`BlobStore::url`].
    async fn put(&self, key: &str, bytes: &[u8]) -> SearchResult<String>;
}

/// Build the blob key `owner/playlist/file_name`.
///
/// # Errors
/// Returns [`SearchError::InvalidInput`] if any part is not a single
/// usable path segment.
pub fn blob_key(owner: &str, playlist: &str, file_name: &str) -> SearchResult<String> {
    let key = format!("{owner}/{playlist}/{file_name}");
    validate_key(&key)?;
    Ok(key)
}

fn validate_key(key: &str) -> SearchResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|seg| seg.trim().is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(SearchError::InvalidInput(format!("invalid blob key '{key}'")));
    }
    Ok(())
}

/// [`BlobStore`] backed by a local directory.
///
/// URLs are `<base_url>/<key>` when a base URL is configured, otherwise
/// `file://` URLs pointing at the stored file.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl FsBlobStore {
    /// A relative `root` is resolved against the current directory so
    /// `file://` URLs stay absolute.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        let root = root.into();
        let root = match std::path::absolute(&root) {
            Ok(abs) => abs,
            Err(e) => {
                log::debug!("Keeping relative blob root {}: {e}", root.display());
                root
            }
        };
        Self {
            root,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, key: &str) -> String {
        match self.base_url {
            Some(ref base) => format!("{base}/{key}"),
            None => format!("file://{}", self.root.join(key).display()),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn url(&self, key: &str) -> SearchResult<String> {
        validate_key(key)?;
        Ok(self.url_for(key))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> SearchResult<String> {
        validate_key(key)?;

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SearchError::Blob(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| SearchError::Blob(format!("{}: {e}", path.display())))?;

        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(self.url_for(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blob_key_layout() {
        assert_eq!(blob_key("u1", "mix", "a.mp3").unwrap(), "u1/mix/a.mp3");
    }

    #[test]
    fn test_blob_key_rejects_traversal() {
        assert!(blob_key("u1", "..", "a.mp3").is_err());
        assert!(blob_key("u1", "mix", "").is_err());
        assert!(blob_key("", "mix", "a.mp3").is_err());
        assert!(blob_key("u1", "mix", "x/../../etc").is_err());
        assert!(validate_key("/abs/path").is_err());
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_file_url() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), None);

        let url = store.put("u1/mix/a.wav", b"RIFF").await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("u1/mix/a.wav"));
        assert_eq!(store.url("u1/mix/a.wav").unwrap(), url);
        assert_eq!(std::fs::read(dir.path().join("u1/mix/a.wav")).unwrap(), b"RIFF");
    }

    #[tokio::test]
    async fn test_put_uses_base_url() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), Some("https://cdn.example.com/audio/".into()));

        let url = store.put("u1/mix/a.wav", b"RIFF").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/audio/u1/mix/a.wav");
    }

    #[test]
    fn test_url_is_known_before_put() {
        let store = FsBlobStore::new("blobs", None);
        assert!(store.root().is_absolute());

        let url = store.url("u1/mix/a.wav").unwrap();
        assert_eq!(url, format!("file://{}", store.root().join("u1/mix/a.wav").display()));
        assert!(!store.root().join("u1").exists());
        assert!(store.url("u1/../a.wav").is_err());
    }
}
