//! Collapse a complex spectrum into a fixed-length unit vector.
//!
//! The spectrum is viewed as `[re_0 .. re_{N-1}, im_0 .. im_{N-1}]`. Every
//! `step`-th element of that sequence is kept, starting at index 0, where
//! `step = floor(2N / 1536)`; only the first 1536 picks survive and the
//! remainder is dropped. Vectors already stored in an index depend on this
//! exact truncation, so it must not change.

use cadenza_core::{EmbeddingVector, EMBEDDING_DIM};

use super::spectrum::Complex;
use crate::error::{EmbedError, EmbedResult};

/// Smallest spectrum length that yields a stride of at least one.
pub const MIN_SPECTRUM_LEN: usize = EMBEDDING_DIM / 2;

/// Reduce `spectrum` to a unit-norm embedding.
pub fn reduce(spectrum: &[Complex<f64>]) -> EmbedResult<EmbeddingVector> {
    let n = spectrum.len();
    let step = (2 * n) / EMBEDDING_DIM;
    if step == 0 {
        return Err(EmbedError::InsufficientSamples {
            samples: n,
            required: MIN_SPECTRUM_LEN,
        });
    }

    let picked: Vec<f64> = (0..EMBEDDING_DIM)
        .map(|i| {
            let idx = i * step;
            if idx < n {
                spectrum[idx].re
            } else {
                spectrum[idx - n].im
            }
        })
        .collect();

    let norm = picked.iter().map(|x| x * x).sum::<f64>().sqrt();
    if !norm.is_finite() {
        return Err(EmbedError::DegenerateVector(format!("norm is {norm}")));
    }
    if norm == 0.0 {
        return Err(EmbedError::DegenerateVector("norm is zero".to_string()));
    }

    #[allow(clippy::cast_possible_truncation)]
    let components: Vec<f32> = picked.iter().map(|x| (x / norm) as f32).collect();

    EmbeddingVector::from_unit_components(components)
        .map_err(|e| EmbedError::DegenerateVector(e.to_string()))
}
