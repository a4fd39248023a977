//! Error types for the embedding pipeline.

use thiserror::Error;

/// Errors produced while turning audio bytes into an embedding.
///
/// Every failure is surfaced to the caller as-is; the pipeline never
/// retries and never returns a partial vector.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The buffer is empty or is not a decodable audio container.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// The decoded stream has no usable channel layout.
    #[error("unsupported channel layout: {0}")]
    UnsupportedChannelLayout(String),

    /// The spectral transform received no samples.
    #[error("input too short: the spectral transform needs at least one sample")]
    InputTooShort,

    /// Too few samples to fill the embedding.
    #[error("insufficient samples: got {samples}, need at least {required}")]
    InsufficientSamples { samples: usize, required: usize },

    /// The reduced vector has zero or non-finite length.
    #[error("degenerate vector: {0}")]
    DegenerateVector(String),

    /// The input exceeds a configured size or duration ceiling.
    #[error("input too large: {0}")]
    InputTooLarge(String),

    /// Every worker slot and queue slot is taken.
    #[error("embedding pool saturated ({capacity} computations in flight)")]
    PoolSaturated { capacity: usize },

    /// A worker task panicked or was torn down.
    #[error("embedding worker failed: {0}")]
    Worker(String),
}

impl EmbedError {
    /// Stable machine-readable name of the error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::UnsupportedChannelLayout(_) => "unsupported_channel_layout",
            Self::InputTooShort => "input_too_short",
            Self::InsufficientSamples { .. } => "insufficient_samples",
            Self::DegenerateVector(_) => "degenerate_vector",
            Self::InputTooLarge(_) => "input_too_large",
            Self::PoolSaturated { .. } => "pool_saturated",
            Self::Worker(_) => "worker",
        }
    }

    /// Returns `true` when resubmitting the same input may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::PoolSaturated { .. })
    }
}

/// Convenience alias for pipeline results.
pub type EmbedResult<T> = std::result::Result<T, EmbedError>;
