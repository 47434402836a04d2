use rdev::Key;

use parle_core::error::{ParleError, Result};

/// One element of a hotkey combination.
///
/// Modifiers are side-agnostic: `Control` matches both `ControlLeft` and
/// `ControlRight`. Everything else matches a single concrete key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    Control,
    Shift,
    Alt,
    Meta,
    Key(Key),
}

impl KeySpec {
    pub fn matches(self, key: Key) -> bool {
        match self {
            KeySpec::Control => matches!(key, Key::ControlLeft | Key::ControlRight),
            KeySpec::Shift => matches!(key, Key::ShiftLeft | Key::ShiftRight),
            KeySpec::Alt => matches!(key, Key::Alt | Key::AltGr),
            KeySpec::Meta => matches!(key, Key::MetaLeft | Key::MetaRight),
            KeySpec::Key(k) => key == k,
        }
    }
}

/// A parsed hotkey combination. The combination is considered pressed when
/// every element has a matching key held down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCombo {
    pub keys: Vec<KeySpec>,
}

/// Parses a combination string such as `"Ctrl+Shift+Space"` or `"Ctrl+Alt"`.
///
/// Tokens are case-insensitive and separated by `+`. Duplicate tokens are
/// collapsed. An empty string or an unrecognized token is a
/// [`ParleError::Hotkey`].
pub fn parse_combo(spec: &str) -> Result<HotkeyCombo> {
    let mut keys = Vec::new();
    for token in spec.split('+') {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParleError::Hotkey(format!(
                "Invalid hotkey '{spec}': empty component"
            )));
        }
        let key = parse_token(token)
            .ok_or_else(|| ParleError::Hotkey(format!("Unknown key '{token}' in hotkey '{spec}'")))?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    if keys.is_empty() {
        return Err(ParleError::Hotkey("Hotkey must name at least one key".to_string()));
    }
    Ok(HotkeyCombo { keys })
}

fn parse_token(token: &str) -> Option<KeySpec> {
    let lower = token.to_ascii_lowercase();
    let spec = match lower.as_str() {
        "ctrl" | "control" => KeySpec::Control,
        "shift" => KeySpec::Shift,
        "alt" | "option" => KeySpec::Alt,
        "meta" | "cmd" | "command" | "super" | "win" => KeySpec::Meta,
        "space" => KeySpec::Key(Key::Space),
        "enter" | "return" => KeySpec::Key(Key::Return),
        "tab" => KeySpec::Key(Key::Tab),
        "esc" | "escape" => KeySpec::Key(Key::Escape),
        "backspace" => KeySpec::Key(Key::Backspace),
        "delete" => KeySpec::Key(Key::Delete),
        "home" => KeySpec::Key(Key::Home),
        "end" => KeySpec::Key(Key::End),
        "pageup" => KeySpec::Key(Key::PageUp),
        "pagedown" => KeySpec::Key(Key::PageDown),
        "up" => KeySpec::Key(Key::UpArrow),
        "down" => KeySpec::Key(Key::DownArrow),
        "left" => KeySpec::Key(Key::LeftArrow),
        "right" => KeySpec::Key(Key::RightArrow),
        "f1" => KeySpec::Key(Key::F1),
        "f2" => KeySpec::Key(Key::F2),
        "f3" => KeySpec::Key(Key::F3),
        "f4" => KeySpec::Key(Key::F4),
        "f5" => KeySpec::Key(Key::F5),
        "f6" => KeySpec::Key(Key::F6),
        "f7" => KeySpec::Key(Key::F7),
        "f8" => KeySpec::Key(Key::F8),
        "f9" => KeySpec::Key(Key::F9),
        "f10" => KeySpec::Key(Key::F10),
        "f11" => KeySpec::Key(Key::F11),
        "f12" => KeySpec::Key(Key::F12),
        _ => return parse_character(&lower),
    };
    Some(spec)
}

fn parse_character(lower: &str) -> Option<KeySpec> {
    if lower.chars().count() != 1 {
        return None;
    }
    let key = match lower.chars().next()? {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        _ => return None,
    };
    Some(KeySpec::Key(key))
}
