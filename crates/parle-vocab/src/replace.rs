use regex::RegexBuilder;
use tracing::warn;

use parle_core::types::VocabularyEntry;

/// Correct known mis-transcriptions back to their canonical words.
///
/// For every enabled entry, in storage order, each non-empty replacement
/// string is matched case-insensitively and literally (regex metacharacters
/// are escaped) against the progressively rewritten text, and whole-word
/// occurrences are substituted with the entry's canonical word. Sequential
/// application is a contract: earlier replacements can affect what later
/// patterns see.
///
/// A replacement string that fails to compile is logged and skipped; it never
/// aborts the rest of the pass.
pub fn apply_replacements(text: &str, vocabulary: &[VocabularyEntry]) -> String {
    let mut result = text.to_string();
    for entry in vocabulary.iter().filter(|e| e.enabled) {
        for replacement in entry.replacements.iter().filter(|r| !r.is_empty()) {
            result = replace_whole_word(&result, replacement, &entry.word);
        }
    }
    result
}

/// Replace whole-word occurrences of `mistake` (case-insensitive, literal)
/// with `canonical`. A match qualifies only when it is not adjacent to a word
/// character on either side, so "the" fixes "teh cat" but never touches
/// "other", and "AI" never touches "MAIL".
fn replace_whole_word(text: &str, mistake: &str, canonical: &str) -> String {
    let pattern = match RegexBuilder::new(&regex::escape(mistake))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!(mistake, error = %e, "Skipping uncompilable vocabulary replacement");
            return text.to_string();
        }
    };

    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    for found in pattern.find_iter(text) {
        let before = text[..found.start()].chars().next_back();
        let after = text[found.end()..].chars().next();
        let bounded =
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);

        result.push_str(&text[last_end..found.start()]);
        if bounded {
            result.push_str(canonical);
        } else {
            result.push_str(found.as_str());
        }
        last_end = found.end();
    }
    result.push_str(&text[last_end..]);
    result
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
