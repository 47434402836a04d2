use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Vocabulary and modes
// =============================================================================

/// A user-defined vocabulary word with the mis-transcriptions that should be
/// corrected back to it.
///
/// Entries are created and edited through settings and are read-only to the
/// session pipeline, which only ever sees a snapshot per session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// Opaque identifier, stable across edits.
    pub id: String,
    /// Canonical spelling. Never empty once persisted.
    pub word: String,
    /// Known mis-transcriptions, in user order, deduplicated, at most 10.
    #[serde(default)]
    pub replacements: Vec<String>,
    /// Disabled entries are inert for both the prompt hint and replacement.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl VocabularyEntry {
    /// Create an enabled entry with a fresh id.
    pub fn new(word: impl Into<String>, replacements: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            word: word.into(),
            replacements,
            enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A named second-pass instruction applied to a transcript before pasting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub id: String,
    pub name: String,
    /// System prompt sent to the chat model; the raw transcript is the user turn.
    pub system_prompt: String,
    /// Chat model identifier used for this mode.
    pub model: String,
}

// =============================================================================
// Session state and updates
// =============================================================================

/// Operational state of a dictation session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictationState {
    /// No session in progress. Ready to start.
    Idle,
    /// Capturing microphone audio.
    Recording,
    /// Awaiting the transcription provider.
    Transcribing,
    /// Awaiting the chat model for the active mode. Entered only when a mode
    /// is active.
    Formatting,
    /// Writing the result to the clipboard and injecting the paste keystroke.
    Pasting,
    /// Session finished; the update carries the final text.
    Done,
    /// Session failed; the update carries the cause.
    Error,
}

impl std::fmt::Display for DictationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DictationState::Idle => write!(f, "idle"),
            DictationState::Recording => write!(f, "recording"),
            DictationState::Transcribing => write!(f, "transcribing"),
            DictationState::Formatting => write!(f, "formatting"),
            DictationState::Pasting => write!(f, "pasting"),
            DictationState::Done => write!(f, "done"),
            DictationState::Error => write!(f, "error"),
        }
    }
}

/// Status event emitted on every state transition of a dictation session.
///
/// Consumers (UI, logging, tests) subscribe to the same ordered stream and
/// are solely responsible for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationUpdate {
    pub state: DictationState,
    /// Human-readable cause, present on `error` and optionally elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Final pasted text, present on `done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DictationUpdate {
    pub fn new(state: DictationState) -> Self {
        Self {
            state,
            message: None,
            text: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}
