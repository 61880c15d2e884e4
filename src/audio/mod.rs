//! File decode and live microphone capture, both producing the
//! per-channel `i16` PCM the DSP pipeline consumes.

pub mod decode;
pub mod mic;

pub use decode::{decode_file, decode_file_limited, hash_file_contents, DecodedAudio};
pub use mic::{capture, CaptureConfig};
