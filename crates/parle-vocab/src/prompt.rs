use parle_core::types::VocabularyEntry;

/// Maximum number of canonical words included in the hint.
const MAX_PROMPT_WORDS: usize = 50;
/// Maximum length of the hint string in bytes.
const MAX_PROMPT_CHARS: usize = 800;

/// Build the transcription hint from the enabled vocabulary entries.
///
/// Returns `None` when no entry is enabled: sending no prompt parameter is
/// distinct from sending an empty one, and providers may treat the two
/// differently. Otherwise returns `"Vocabulary: w1, w2, …"` with at most
/// [`MAX_PROMPT_WORDS`] words, capped at [`MAX_PROMPT_CHARS`] characters and
/// backed up to the last `", "` boundary so no word is cut mid-token.
pub fn build_prompt(vocabulary: &[VocabularyEntry]) -> Option<String> {
    let words: Vec<&str> = vocabulary
        .iter()
        .filter(|entry| entry.enabled)
        .take(MAX_PROMPT_WORDS)
        .map(|entry| entry.word.as_str())
        .collect();

    if words.is_empty() {
        return None;
    }

    let mut prompt = format!("Vocabulary: {}", words.join(", "));
    if prompt.len() > MAX_PROMPT_CHARS {
        let mut cut = MAX_PROMPT_CHARS;
        while !prompt.is_char_boundary(cut) {
            cut -= 1;
        }
        prompt.truncate(cut);
        if let Some(boundary) = prompt.rfind(", ") {
            prompt.truncate(boundary);
        }
    }
    Some(prompt)
}
