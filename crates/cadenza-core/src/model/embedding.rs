use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of components in every embedding.
pub const EMBEDDING_DIM: usize = 1536;

/// Maximum distance of the L2 norm from 1.0 accepted for a unit vector.
const NORM_TOLERANCE: f64 = 1e-4;

/// A fixed-length, unit-norm audio embedding.
///
/// Instances can only be built from exactly [`EMBEDDING_DIM`] finite
/// components whose Euclidean norm is 1 (within numerical tolerance), so a
/// value of this type is always safe to submit to the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Wrap components that are already normalized.
    ///
    /// # Errors
    /// Returns [`Error::InvalidData`] when the length is wrong, a component
    /// is NaN or infinite, or the norm is not 1.
    pub fn from_unit_components(components: Vec<f32>) -> Result<Self> {
        if components.len() != EMBEDDING_DIM {
            return Err(Error::InvalidData(format!(
                "embedding must have {EMBEDDING_DIM} components, got {}",
                components.len()
            )));
        }
        if components.iter().any(|c| !c.is_finite()) {
            return Err(Error::InvalidData(
                "embedding contains a non-finite component".to_string(),
            ));
        }
        let norm = l2_norm(&components);
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(Error::InvalidData(format!(
                "embedding is not unit length (norm {norm})"
            )));
        }
        Ok(Self(components))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean length, accumulated in `f64`.
    #[must_use]
    pub fn norm(&self) -> f64 {
        l2_norm(&self.0)
    }

    /// Cosine similarity with another embedding. Both operands are unit
    /// vectors, so this is their dot product.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| f64::from(*a) * f64::from(*b))
            .sum()
    }
}

impl<'de> Deserialize<'de> for EmbeddingVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let components = Vec::<f32>::deserialize(deserializer)?;
        Self::from_unit_components(components).map_err(serde::de::Error::custom)
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

fn l2_norm(components: &[f32]) -> f64 {
    components
        .iter()
        .map(|c| f64::from(*c) * f64::from(*c))
        .sum::<f64>()
        .sqrt()
}
