//! Audio-to-embedding pipeline for cadenza.
//!
//! Decodes an encoded audio buffer to canonical mono PCM, takes its full
//! discrete Fourier transform, and reduces the spectrum to a 1536-component
//! unit vector. [`EmbeddingPool`] runs that work on a bounded set of
//! blocking workers.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod scan;

pub use audio::{DecodeLimits, DecodedAudio};
pub use config::Config;
pub use error::{EmbedError, EmbedResult};
pub use pipeline::{embed_audio, embed_samples, AudioEmbedding};
pub use pool::EmbeddingPool;
pub use scan::{discover_audio_files, DiscoveredFile};
