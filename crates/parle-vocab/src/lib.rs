//! Parle vocabulary crate - transcription hint building and mis-transcription
//! correction.
//!
//! Two pure text transforms over the user's vocabulary:
//! - [`build_prompt`] produces a bounded hint string sent alongside the audio
//!   to bias the transcription toward expected words.
//! - [`apply_replacements`] rewrites known mis-transcriptions back to their
//!   canonical spelling, case-insensitively and whole-word only.

pub mod prompt;
pub mod replace;

pub use prompt::build_prompt;
pub use replace::apply_replacements;
