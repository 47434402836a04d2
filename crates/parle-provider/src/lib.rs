//! Parle provider crate - OpenAI-compatible transcription and chat-completion
//! clients.
//!
//! Defines the `Transcriber` and `ChatCompleter` ports consumed by the
//! session manager, HTTP implementations of both against any
//! OpenAI-compatible endpoint, the provider capability side-table that
//! decides whether a transcription hint may be sent, and connection
//! diagnostics used by settings flows.

pub mod capability;
pub mod complete;
pub mod diagnostics;
pub mod transcribe;

pub use capability::supports_prompt;
pub use complete::{ChatCompleter, HttpChatCompleter};
pub use diagnostics::{fetch_models, test_connection};
pub use transcribe::{HttpTranscriber, Transcriber};
