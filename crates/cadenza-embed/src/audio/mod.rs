pub mod canonical;
pub mod decoder;
pub mod reducer;
pub mod spectrum;

pub use canonical::canonicalize;
pub use decoder::{decode_audio, DecodeLimits, DecodedAudio};
pub use reducer::{reduce, MIN_SPECTRUM_LEN};
pub use spectrum::{spectrum, Complex};
