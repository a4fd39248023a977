pub mod asset;
pub mod embedding;
pub mod ids;
pub mod metadata;
pub mod similarity;

pub use asset::AudioAsset;
pub use embedding::{EmbeddingVector, EMBEDDING_DIM};
pub use ids::{AssetId, VectorId};
pub use metadata::{MetadataKey, Namespace, TrackMetadata};
pub use similarity::SimilarityMatch;
