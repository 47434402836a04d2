//! Parle audio crate - microphone capture to in-memory WAV.
//!
//! Capture runs on a dedicated thread owning the cpal stream (cpal streams
//! are not `Send`); samples accumulate as f32 under a mutex and are downmixed
//! to mono 16-bit PCM at the device rate when the recording stops. The
//! recording buffer is owned exclusively by the in-flight session.

pub mod recorder;
pub mod wav;

pub use recorder::{CpalRecorder, Recorder};
pub use wav::encode_wav_mono16;
