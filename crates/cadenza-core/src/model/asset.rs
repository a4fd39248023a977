use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::ids::AssetId;
use crate::model::metadata::{Namespace, TrackMetadata};

/// An uploaded audio track.
///
/// Created once by the upload flow and never modified afterwards. The raw
/// bytes live in the blob store under `blob_key`; `url` is the address the
/// blob store returned and is unique across all assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub id: AssetId,

    /// Owning user.
    pub owner: String,

    /// Playlist the track was uploaded into.
    pub playlist: String,

    /// Retrievable address of the raw audio.
    pub url: String,

    pub title: String,

    /// Whole seconds of decoded audio.
    pub duration_secs: u64,

    /// Key of the raw audio in the blob store.
    pub blob_key: String,

    pub namespace: Namespace,

    pub created_at: DateTime<Utc>,
}

impl AudioAsset {
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        playlist: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        duration_secs: u64,
        blob_key: impl Into<String>,
    ) -> Self {
        Self {
            id: AssetId::new(),
            owner: owner.into(),
            playlist: playlist.into(),
            url: url.into(),
            title: title.into(),
            duration_secs,
            blob_key: blob_key.into(),
            namespace: Namespace::audio_tracks(),
            created_at: Utc::now(),
        }
    }

    /// Metadata submitted to the similarity index for this asset.
    #[must_use]
    pub fn track_metadata(&self) -> TrackMetadata {
        let mut extra = Map::new();
        extra.insert("id".to_string(), Value::from(self.id.to_string()));
        extra.insert("user".to_string(), Value::from(self.owner.as_str()));
        extra.insert("playlist".to_string(), Value::from(self.playlist.as_str()));
        extra.insert("title".to_string(), Value::from(self.title.as_str()));

        TrackMetadata {
            namespace: self.namespace.clone(),
            url: self.url.clone(),
            duration_secs: Some(self.duration_secs),
            extra,
        }
    }
}
