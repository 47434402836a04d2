/// Whether a provider/model combination accepts a transcription hint.
///
/// A static decision table, consulted once per transcription call rather than
/// woven through the session state machine:
/// - "groq" accepts a prompt for all of its transcription models.
/// - "openai" accepts it only for whisper-family models; the newer
///   gpt-4o-transcribe family rejects the parameter.
/// - Anything else (including "custom" endpoints) is assumed to accept it:
///   omission only costs accuracy, and the HTTP client degrades gracefully by
///   retrying without the prompt if the remote rejects it.
pub fn supports_prompt(provider: &str, model: &str) -> bool {
    match provider {
        "groq" => true,
        "openai" => model.to_ascii_lowercase().starts_with("whisper"),
        _ => true,
    }
}
