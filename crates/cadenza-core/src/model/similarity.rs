use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result of a nearest-neighbour query.
///
/// Scores come from the similarity index and are never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SimilarityMatch {
    #[must_use]
    pub fn new(score: f32, metadata: Map<String, Value>) -> Self {
        Self {
            id: None,
            score,
            metadata,
        }
    }

    /// The `url` metadata field, if present.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.metadata.get("url").and_then(Value::as_str)
    }
}
