//! Canonical PCM container.
//!
//! Whatever the input container was, the mono stream is written out as a
//! 16-bit signed PCM WAV and the samples are read back from that buffer, so
//! sample extraction is identical for every input format.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{EmbedError, EmbedResult};

const BITS_PER_SAMPLE: u16 = 16;

/// Full-scale value of a 16-bit sample.
const FULL_SCALE: f32 = 32768.0;

/// Quantize a normalized `f32` sample to 16-bit PCM.
#[allow(clippy::cast_possible_truncation)]
fn quantize(sample: f32) -> i16 {
    (sample * FULL_SCALE)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Encode mono samples as a 16-bit PCM WAV held in memory.
pub fn encode_wav(mono: &[f32], sample_rate: u32) -> EmbedResult<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::with_capacity(44 + mono.len() * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buffer), spec)
            .map_err(|e| EmbedError::Decode(format!("failed to start canonical WAV: {e}")))?;
        for &sample in mono {
            writer
                .write_sample(quantize(sample))
                .map_err(|e| EmbedError::Decode(format!("failed to write canonical WAV: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| EmbedError::Decode(format!("failed to finish canonical WAV: {e}")))?;
    }

    Ok(buffer)
}

/// Read the integer samples of a canonical WAV as `f64`.
pub fn read_wav(bytes: &[u8]) -> EmbedResult<Vec<f64>> {
    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| EmbedError::Decode(format!("failed to read canonical WAV: {e}")))?;

    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != BITS_PER_SAMPLE {
        return Err(EmbedError::Decode(format!(
            "canonical WAV must be 16-bit mono, got {} channels at {} bits",
            spec.channels, spec.bits_per_sample
        )));
    }

    reader
        .into_samples::<i16>()
        .map(|s| s.map(f64::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EmbedError::Decode(format!("failed to read canonical WAV: {e}")))
}

/// Round-trip a mono stream through the canonical container.
pub fn canonicalize(mono: &[f32], sample_rate: u32) -> EmbedResult<Vec<f64>> {
    read_wav(&encode_wav(mono, sample_rate)?)
}
