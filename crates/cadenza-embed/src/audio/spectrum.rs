//! Full-length discrete Fourier transform.
//!
//! The transform is applied to the whole sample sequence with no window,
//! padding or pre-emphasis.

use rustfft::FftPlannerScalar;

pub use rustfft::num_complex::Complex;

use crate::error::{EmbedError, EmbedResult};

/// Compute the N-point DFT of `samples`.
///
/// Planned with the scalar planner so the arithmetic does not depend on the
/// SIMD features of the host CPU.
pub fn spectrum(samples: &[f64]) -> EmbedResult<Vec<Complex<f64>>> {
    if samples.is_empty() {
        return Err(EmbedError::InputTooShort);
    }

    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();

    let mut planner = FftPlannerScalar::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);

    Ok(buffer)
}
