//! Local audio signal processing: pitch, loudness, pace and WAV re-encoding.

pub mod pitch;
pub mod signal;
pub mod wav;

pub use pitch::{PitchDetector, Yin};
pub use signal::extract_signal_metrics;
pub use wav::{WAV_HEADER_LEN, encode_wav, float_to_pcm16};
