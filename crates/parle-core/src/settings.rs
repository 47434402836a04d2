use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{Mode, VocabularyEntry};

/// Maximum number of vocabulary entries kept in the settings document.
pub const MAX_VOCABULARY_ENTRIES: usize = 100;
/// Maximum number of mistake strings kept per vocabulary entry.
pub const MAX_REPLACEMENTS_PER_ENTRY: usize = 10;

/// How the hotkey triggers a session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyMode {
    /// Press starts recording, release stops it.
    #[default]
    Hold,
    /// Each press alternates between start and stop.
    Toggle,
}

/// On-disk settings document.
///
/// Every field has a default so that a document written by an older version
/// (or missing entirely) always deserializes. Failure to load must never
/// crash the process; callers use [`AppSettings::load_or_default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Transcription provider family: "openai", "groq", or "custom".
    pub provider: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Transcription model identifier.
    pub model: String,
    /// Bearer token for the provider.
    pub api_key: String,
    /// Hotkey combination, e.g. "Ctrl+Shift+Space" or modifier-only "Ctrl+Alt".
    pub hotkey: String,
    pub hotkey_mode: HotkeyMode,
    /// Leave the transcript on the clipboard instead of restoring the snapshot.
    pub copy_to_clipboard_on_success: bool,
    pub vocabulary: Vec<VocabularyEntry>,
    /// Id of the active formatting mode, if any.
    pub active_mode_id: Option<String>,
    pub modes: Vec<Mode>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            api_key: String::new(),
            hotkey: "Ctrl+Shift+Space".to_string(),
            hotkey_mode: HotkeyMode::Hold,
            copy_to_clipboard_on_success: false,
            vocabulary: Vec::new(),
            active_mode_id: None,
            modes: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Load settings from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings: AppSettings = toml::from_str(&content)?;
        settings.vocabulary = normalize_vocabulary(settings.vocabulary);
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults if the file is missing or
    /// unreadable. The error is logged, never propagated.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Failed to load settings from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the settings document, creating parent directories as needed.
    ///
    /// Vocabulary limits are enforced here, at the data-entry boundary, so
    /// the replacement engine can assume they hold.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut to_write = self.clone();
        to_write.vocabulary = normalize_vocabulary(to_write.vocabulary);
        let content = toml::to_string_pretty(&to_write)?;
        std::fs::write(path, content)?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// The active formatting mode, if `active_mode_id` names a known mode.
    pub fn active_mode(&self) -> Option<&Mode> {
        let id = self.active_mode_id.as_deref()?;
        self.modes.iter().find(|m| m.id == id)
    }
}

/// Enforce vocabulary invariants at the storage boundary: drop entries with
/// empty words, drop empty replacement strings, dedup replacements
/// case-sensitively preserving first occurrence, cap replacements per entry
/// and total entry count.
pub fn normalize_vocabulary(vocabulary: Vec<VocabularyEntry>) -> Vec<VocabularyEntry> {
    let mut entries: Vec<VocabularyEntry> = vocabulary
        .into_iter()
        .filter(|entry| !entry.word.trim().is_empty())
        .map(|mut entry| {
            let mut seen = std::collections::HashSet::new();
            entry.replacements = entry
                .replacements
                .into_iter()
                .filter(|r| !r.is_empty())
                .filter(|r| seen.insert(r.clone()))
                .take(MAX_REPLACEMENTS_PER_ENTRY)
                .collect();
            entry
        })
        .collect();
    if entries.len() > MAX_VOCABULARY_ENTRIES {
        warn!(
            dropped = entries.len() - MAX_VOCABULARY_ENTRIES,
            "Vocabulary exceeds {} entries, truncating", MAX_VOCABULARY_ENTRIES
        );
        entries.truncate(MAX_VOCABULARY_ENTRIES);
    }
    entries
}

/// Default settings path: `~/.parle/settings.toml`.
pub fn default_settings_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".parle").join("settings.toml")
}

// =============================================================================
// Settings store port
// =============================================================================

/// Persistence port for the settings document.
///
/// `load` never fails fatally; missing or corrupt documents yield defaults.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> AppSettings;
    fn save(&self, settings: &AppSettings) -> Result<()>;
}

/// File-backed settings store.
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for TomlSettingsStore {
    fn default() -> Self {
        Self::new(default_settings_path())
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> AppSettings {
        AppSettings::load_or_default(&self.path)
    }

    fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_settings(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.base_url, "https://api.openai.com/v1");
        assert_eq!(settings.model, "whisper-1");
        assert_eq!(settings.hotkey, "Ctrl+Shift+Space");
        assert_eq!(settings.hotkey_mode, HotkeyMode::Hold);
        assert!(!settings.copy_to_clipboard_on_success);
        assert!(settings.vocabulary.is_empty());
        assert!(settings.modes.is_empty());
        assert!(settings.active_mode_id.is_none());
    }

    #[test]
    fn test_load_document_missing_fields_uses_defaults() {
        // A document from an older version that predates vocabulary, modes,
        // and hotkey_mode must still load.
        let content = r#"
provider = "groq"
api_key = "sk-test"
"#;
        let file = create_temp_settings(content);
        let settings = AppSettings::load(file.path()).unwrap();
        assert_eq!(settings.provider, "groq");
        assert_eq!(settings.api_key, "sk-test");
        assert!(settings.vocabulary.is_empty());
        assert!(settings.modes.is_empty());
        assert_eq!(settings.hotkey_mode, HotkeyMode::Hold);
    }

    #[test]
    fn test_load_empty_document_uses_all_defaults() {
        let file = create_temp_settings("");
        let settings = AppSettings::load(file.path()).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let settings = AppSettings::load_or_default(Path::new("/nonexistent/settings.toml"));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_load_or_default_corrupt_file() {
        let file = create_temp_settings("this is {{ not toml");
        let settings = AppSettings::load_or_default(file.path());
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("settings.toml");

        let mut settings = AppSettings::default();
        settings.provider = "custom".to_string();
        settings.hotkey_mode = HotkeyMode::Toggle;
        settings.vocabulary = vec![VocabularyEntry::new(
            "Kubernetes",
            vec!["cube and eighties".into()],
        )];
        settings.modes = vec![Mode {
            id: "m1".into(),
            name: "Email".into(),
            system_prompt: "Rewrite as a polite email.".into(),
            model: "gpt-4o-mini".into(),
        }];
        settings.active_mode_id = Some("m1".into());
        settings.save(&path).unwrap();

        let reloaded = AppSettings::load(&path).unwrap();
        assert_eq!(reloaded, settings);
        assert_eq!(reloaded.active_mode().unwrap().name, "Email");
    }

    #[test]
    fn test_hotkey_mode_serializes_snake_case() {
        let toml_str = toml::to_string(&AppSettings {
            hotkey_mode: HotkeyMode::Toggle,
            ..AppSettings::default()
        })
        .unwrap();
        assert!(toml_str.contains("hotkey_mode = \"toggle\""));
    }

    #[test]
    fn test_active_mode_none_when_id_unknown() {
        let mut settings = AppSettings::default();
        settings.active_mode_id = Some("missing".into());
        assert!(settings.active_mode().is_none());
    }

    #[test]
    fn test_normalize_drops_empty_words_and_replacements() {
        let vocabulary = vec![
            VocabularyEntry::new("", vec!["x".into()]),
            VocabularyEntry::new("the", vec!["teh".into(), "".into(), "teh".into()]),
        ];
        let normalized = normalize_vocabulary(vocabulary);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].replacements, vec!["teh".to_string()]);
    }

    #[test]
    fn test_normalize_dedup_is_case_sensitive() {
        let vocabulary = vec![VocabularyEntry::new(
            "AI",
            vec!["ay eye".into(), "Ay Eye".into(), "ay eye".into()],
        )];
        let normalized = normalize_vocabulary(vocabulary);
        assert_eq!(
            normalized[0].replacements,
            vec!["ay eye".to_string(), "Ay Eye".to_string()]
        );
    }

    #[test]
    fn test_normalize_caps_replacements_per_entry() {
        let replacements: Vec<String> = (0..20).map(|i| format!("r{i}")).collect();
        let normalized = normalize_vocabulary(vec![VocabularyEntry::new("w", replacements)]);
        assert_eq!(normalized[0].replacements.len(), MAX_REPLACEMENTS_PER_ENTRY);
    }

    #[test]
    fn test_normalize_caps_total_entries() {
        let vocabulary: Vec<VocabularyEntry> = (0..150)
            .map(|i| VocabularyEntry::new(format!("w{i}"), vec![]))
            .collect();
        let normalized = normalize_vocabulary(vocabulary);
        assert_eq!(normalized.len(), MAX_VOCABULARY_ENTRIES);
        // Storage order preserved.
        assert_eq!(normalized[0].word, "w0");
        assert_eq!(normalized[99].word, "w99");
    }

    #[test]
    fn test_toml_store_load_missing_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
        let settings = store.load();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_toml_store_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
        let mut settings = AppSettings::default();
        settings.model = "whisper-large-v3".to_string();
        store.save(&settings).unwrap();
        assert_eq!(store.load().model, "whisper-large-v3");
    }
}
