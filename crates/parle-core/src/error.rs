use thiserror::Error;

/// Top-level error type for the Parle system.
///
/// Subsystem crates construct the variant for their concern and let the `?`
/// operator carry it up to the session manager, which surfaces the message
/// verbatim on the emitted `error` update. The session manager relies on the
/// variant to distinguish recoverable failures (formatting) from fatal ones.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParleError {
    /// A recording session is already in flight; the new request is rejected,
    /// not queued.
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// Stop was requested while no recording session was active.
    #[error("No recording in progress")]
    NotRecording,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio error: {0}")]
    Audio(String),

    /// Transcription or completion call failed (network or API-level).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Clipboard could not be read or written after bounded retries.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Synthesized paste keystroke was refused or unavailable.
    #[error("Paste injection error: {0}")]
    PasteInjection(String),

    #[error("Hotkey error: {0}")]
    Hotkey(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ParleError {
    fn from(err: toml::de::Error) -> Self {
        ParleError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ParleError {
    fn from(err: toml::ser::Error) -> Self {
        ParleError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ParleError {
    fn from(err: serde_json::Error) -> Self {
        ParleError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Parle operations.
pub type Result<T> = std::result::Result<T, ParleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ParleError::AlreadyRecording.to_string(),
            "A recording is already in progress"
        );
        assert_eq!(
            ParleError::NotRecording.to_string(),
            "No recording in progress"
        );
        assert_eq!(
            ParleError::Provider("timeout".to_string()).to_string(),
            "Provider error: timeout"
        );
        assert_eq!(
            ParleError::Clipboard("locked".to_string()).to_string(),
            "Clipboard error: locked"
        );
        assert_eq!(
            ParleError::PasteInjection("not permitted".to_string()).to_string(),
            "Paste injection error: not permitted"
        );
    }

    #[test]
    fn test_clipboard_and_injection_are_distinct_kinds() {
        let clipboard = ParleError::Clipboard("busy".into());
        let injection = ParleError::PasteInjection("busy".into());
        assert!(matches!(clipboard, ParleError::Clipboard(_)));
        assert!(matches!(injection, ParleError::PasteInjection(_)));
        assert_ne!(clipboard.to_string(), injection.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ParleError = io_err.into();
        assert!(matches!(err, ParleError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let bad: std::result::Result<toml::Value, _> = toml::from_str("this is {{ not toml");
        let err: ParleError = bad.unwrap_err().into();
        assert!(matches!(err, ParleError::Config(_)));
    }
}
