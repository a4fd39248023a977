//! Decode → transform → reduce for a single input.
//!
//! Everything here is synchronous and CPU-bound; async callers go through
//! [`crate::EmbeddingPool`].

use cadenza_core::EmbeddingVector;

use crate::audio::{decode_audio, reduce, spectrum, DecodeLimits};
use crate::error::EmbedResult;

/// An embedding together with what was measured while producing it.
#[derive(Debug, Clone)]
pub struct AudioEmbedding {
    pub vector: EmbeddingVector,
    /// Duration of the decoded source audio.
    pub duration_secs: f64,
    /// Number of canonical samples fed to the transform.
    pub sample_count: usize,
    pub sample_rate: u32,
}

impl AudioEmbedding {
    /// Duration truncated to whole seconds, as stored in metadata.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn whole_seconds(&self) -> u64 {
        self.duration_secs.max(0.0) as u64
    }
}

/// Embed an encoded audio buffer.
///
/// Any owned buffer works, so callers holding shared bytes can embed
/// without copying them.
pub fn embed_audio<B>(bytes: B, limits: &DecodeLimits) -> EmbedResult<AudioEmbedding>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    let decoded = decode_audio(bytes, limits)?;
    let vector = embed_samples(&decoded.samples)?;

    Ok(AudioEmbedding {
        vector,
        duration_secs: decoded.duration_secs,
        sample_count: decoded.samples.len(),
        sample_rate: decoded.sample_rate,
    })
}

/// Embed already-decoded canonical samples.
pub fn embed_samples(samples: &[f64]) -> EmbedResult<EmbeddingVector> {
    let spectrum = spectrum(samples)?;
    reduce(&spectrum)
}
