//! Typed metadata attached to a vector at ingestion time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};

/// A logical partition label interpreted by the similarity index.
///
/// Ingestion and query must use the same namespace for their results to
/// be comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Namespace used for uploaded tracks.
    pub const AUDIO_TRACKS: &'static str = "audio_tracks";

    /// Create a namespace from a label.
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] if the label is empty or only whitespace.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(Error::InvalidData("namespace must not be empty".to_string()));
        }
        Ok(Self(label))
    }

    #[must_use]
    pub fn audio_tracks() -> Self {
        Self(Self::AUDIO_TRACKS.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::audio_tracks()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

/// Keys every metadata map submitted to the index must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Namespace,
    Url,
    Duration,
}

impl MetadataKey {
    pub const REQUIRED: [Self; 3] = [Self::Namespace, Self::Url, Self::Duration];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Url => "url",
            Self::Duration => "duration",
        }
    }

    fn is_reserved(key: &str) -> bool {
        Self::REQUIRED.iter().any(|k| k.as_str() == key)
    }
}

/// Metadata attached to one embedding.
///
/// `url` identifies the source of the audio (an asset URL, a remote
/// address, or any caller-chosen identifier). `duration_secs` may be left
/// unset when ingesting raw audio; the ingestion coordinator fills it from
/// the decoded audio. `extra` carries passthrough fields and may not
/// redefine a required key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub namespace: Namespace,
    pub url: String,
    pub duration_secs: Option<u64>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl TrackMetadata {
    #[must_use]
    pub fn new(namespace: Namespace, url: impl Into<String>) -> Self {
        Self {
            namespace,
            url: url.into(),
            duration_secs: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u64) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Check everything except the duration, which may still be pending
    /// until the audio has been decoded.
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] if the url is blank or a passthrough
    /// key shadows a required key.
    pub fn validate_source(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidData("metadata url must not be empty".to_string()));
        }
        if let Some(key) = self.extra.keys().find(|k| MetadataKey::is_reserved(k)) {
            return Err(Error::InvalidData(format!(
                "passthrough key '{key}' shadows a required metadata key"
            )));
        }
        Ok(())
    }

    /// Check the required key set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] if [`Self::validate_source`] fails or
    /// the duration is missing.
    pub fn validate(&self) -> Result<()> {
        self.validate_source()?;
        if self.duration_secs.is_none() {
            return Err(Error::InvalidData("metadata duration is missing".to_string()));
        }
        Ok(())
    }

    /// Flatten into the JSON map sent alongside the vector.
    ///
    /// # Errors
    /// Fails when [`Self::validate`] fails.
    pub fn to_index_map(&self) -> Result<Map<String, Value>> {
        self.validate()?;
        let mut map = self.extra.clone();
        map.insert(
            MetadataKey::Namespace.as_str().to_string(),
            Value::from(self.namespace.as_str()),
        );
        map.insert(MetadataKey::Url.as_str().to_string(), Value::from(self.url.as_str()));
        map.insert(
            MetadataKey::Duration.as_str().to_string(),
            Value::from(self.duration_secs.unwrap_or_default()),
        );
        Ok(map)
    }
}
