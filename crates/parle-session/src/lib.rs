//! Parle session crate - the dictation session lifecycle.
//!
//! A session runs hotkey-to-paste: capture audio, transcribe it through the
//! configured provider, optionally reformat it with the active mode's chat
//! model, correct it against the user vocabulary, and paste it into the
//! focused application. The [`DictationSessionManager`] owns the state
//! machine and the subsystem ports; every transition is published as a
//! [`parle_core::DictationUpdate`] on a broadcast channel.
//!
//! At most one session is in flight. Overlapping starts and stops are
//! rejected immediately with `AlreadyRecording`/`NotRecording` rather than
//! queued, so a stuck provider call can never build up a backlog of
//! half-finished sessions.

pub mod driver;
pub mod manager;
pub mod state;

pub use driver::HotkeyDriver;
pub use manager::{DictationSessionManager, HttpProviderFactory, ProviderFactory};
pub use state::StateMachine;
