use enigo::{
    Direction::{Click, Press, Release},
    Enigo, Key, Keyboard, Settings,
};

use parle_core::error::{ParleError, Result};

/// Port for synthesizing the platform paste keystroke into the focused
/// application. Best-effort: higher-privilege targets may refuse the input.
pub trait KeystrokeInjector: Send {
    fn send_paste(&mut self) -> Result<()>;
}

/// Keystroke injector backed by enigo.
///
/// Sends Cmd+V on macOS and Ctrl+V elsewhere. macOS refuses synthesized
/// input without the Accessibility permission; those failures are rewritten
/// into an actionable message.
#[derive(Default)]
pub struct EnigoInjector;

impl EnigoInjector {
    pub fn new() -> Self {
        Self
    }
}

impl KeystrokeInjector for EnigoInjector {
    fn send_paste(&mut self) -> Result<()> {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| injection_error(e.to_string()))?;
        let modifier = paste_modifier_key();
        enigo
            .key(modifier, Press)
            .map_err(|e| injection_error(e.to_string()))?;
        enigo
            .key(Key::Unicode('v'), Click)
            .map_err(|e| injection_error(e.to_string()))?;
        enigo
            .key(modifier, Release)
            .map_err(|e| injection_error(e.to_string()))?;
        Ok(())
    }
}

fn paste_modifier_key() -> Key {
    // macOS pastes with Command, Windows/Linux with Control.
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

fn injection_error(message: String) -> ParleError {
    ParleError::PasteInjection(wrap_accessibility_error(message))
}

#[cfg(target_os = "macos")]
fn wrap_accessibility_error(message: String) -> String {
    let normalized = message.to_ascii_lowercase();
    let permission_error = normalized.contains("accessibility")
        || normalized.contains("not permitted")
        || normalized.contains("permission denied")
        || normalized.contains("not trusted")
        || normalized.contains("trust");

    if permission_error {
        "Accessibility permission required. Grant access to Parle in System Settings > \
         Privacy & Security > Accessibility, then restart the app."
            .to_string()
    } else {
        message
    }
}

#[cfg(not(target_os = "macos"))]
fn wrap_accessibility_error(message: String) -> String {
    message
}
