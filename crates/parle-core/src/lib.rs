//! Parle core crate - shared error type, settings document, and domain types.
//!
//! Every other crate in the workspace depends on this one. It defines the
//! `ParleError` type that crosses crate boundaries, the on-disk settings
//! document (with defaults for every field so old documents always load),
//! and the dictation session types exchanged between the session manager
//! and its observers.

pub mod error;
pub mod settings;
pub mod types;

pub use error::{ParleError, Result};
pub use settings::{AppSettings, HotkeyMode, SettingsStore, TomlSettingsStore};
pub use types::{DictationState, DictationUpdate, Mode, VocabularyEntry};
