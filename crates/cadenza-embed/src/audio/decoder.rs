use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::canonical::canonicalize;
use crate::error::{EmbedError, EmbedResult};

/// Ceilings applied to an input before and while it is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted encoded buffer, in bytes.
    pub max_input_bytes: usize,
    /// Longest accepted audio, in seconds.
    pub max_duration_secs: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            max_duration_secs: 900,
        }
    }
}

impl DecodeLimits {
    /// Reject empty or oversized buffers without looking at their content.
    pub fn check_input_size(&self, len: usize) -> EmbedResult<()> {
        if len == 0 {
            return Err(EmbedError::Decode("empty input buffer".to_string()));
        }
        if len > self.max_input_bytes {
            return Err(EmbedError::InputTooLarge(format!(
                "{len} bytes exceeds the {} byte limit",
                self.max_input_bytes
            )));
        }
        Ok(())
    }

    fn max_frames(&self, sample_rate: u32) -> u64 {
        self.max_duration_secs.saturating_mul(u64::from(sample_rate))
    }

    fn too_long(&self, frames: u64, sample_rate: u32) -> EmbedError {
        #[allow(clippy::cast_precision_loss)]
        let secs = frames as f64 / f64::from(sample_rate);
        EmbedError::InputTooLarge(format!(
            "{secs:.1}s of audio exceeds the {}s limit",
            self.max_duration_secs
        ))
    }
}

/// Canonical mono PCM extracted from an encoded buffer.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// 16-bit sample values read back from the canonical container.
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    /// Channel count of the source stream, before downmixing.
    pub channels: usize,
    /// Length of the decoded source stream. Measured independently of the
    /// canonical buffer.
    pub duration_secs: f64,
}

/// Decode an encoded audio buffer to canonical mono PCM.
///
/// Stereo (and any other multi-channel layout) is downmixed by averaging
/// the channels frame by frame. The mono stream is then re-encoded through
/// the canonical container before samples are extracted.
pub fn decode_audio<B>(bytes: B, limits: &DecodeLimits) -> EmbedResult<DecodedAudio>
where
    B: AsRef<[u8]> + Send + Sync + 'static,
{
    limits.check_input_size(bytes.as_ref().len())?;

    // 1. Probe the container
    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(bytes)),
        MediaSourceStreamOptions::default(),
    );

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EmbedError::Decode(format!("unrecognized container: {e}")))?;

    let mut format = probed.format;

    // 2. Find the default audio track
    let track = format
        .default_track()
        .ok_or_else(|| EmbedError::Decode("no default audio track".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    // 3. Reject declared overlong streams before decoding any packet
    if let (Some(frames), Some(rate)) = (codec_params.n_frames, codec_params.sample_rate) {
        if rate > 0 && frames > limits.max_frames(rate) {
            return Err(limits.too_long(frames, rate));
        }
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| EmbedError::Decode(format!("unsupported codec: {e}")))?;

    // 4. Decode and downmix packet by packet
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut mono = Vec::new();
    let mut channels: Option<usize> = None;
    let mut sample_rate = codec_params.sample_rate;
    let mut frames: u64 = 0;
    let mut skipped_packets = 0_usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(EmbedError::Decode(format!("failed to read packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("Skipping undecodable packet: {e}");
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(EmbedError::Decode(format!("failed to decode packet: {e}"))),
        };

        let spec = *audio_buf.spec();
        let count = spec.channels.count();
        match channels {
            _ if count == 0 => {
                return Err(EmbedError::UnsupportedChannelLayout(
                    "stream reports zero channels".to_string(),
                ));
            }
            Some(known) if known != count => {
                return Err(EmbedError::UnsupportedChannelLayout(format!(
                    "channel count changed from {known} to {count} mid-stream"
                )));
            }
            _ => channels = Some(count),
        }
        let rate = *sample_rate.get_or_insert(spec.rate);

        frames += audio_buf.frames() as u64;
        if rate > 0 && frames > limits.max_frames(rate) {
            return Err(limits.too_long(frames, rate));
        }

        let needed = audio_buf.capacity() * count;
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(audio_buf);
            push_downmixed(&mut mono, buf.samples(), count);
        }
    }

    if frames == 0 && skipped_packets > 0 {
        return Err(EmbedError::Decode(format!(
            "none of {skipped_packets} packets could be decoded"
        )));
    }

    let sample_rate = sample_rate
        .filter(|&rate| rate > 0)
        .ok_or_else(|| EmbedError::Decode("stream has no sample rate".to_string()))?;
    let channels = channels
        .or_else(|| codec_params.channels.map(|c| c.count()))
        .unwrap_or(1);

    #[allow(clippy::cast_precision_loss)]
    let duration_secs = frames as f64 / f64::from(sample_rate);

    // 5. Re-encode through the canonical container
    let samples = canonicalize(&mono, sample_rate)?;

    log::debug!(
        "Decoded {frames} frames ({channels} ch @ {sample_rate} Hz, {duration_secs:.2}s) into {} canonical samples",
        samples.len()
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
        duration_secs,
    })
}

/// Append interleaved frames to `mono`, averaging across channels.
#[allow(clippy::cast_precision_loss)]
fn push_downmixed(mono: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels == 1 {
        mono.extend_from_slice(interleaved);
    } else {
        mono.extend(
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }
}
