//! Parle hotkey crate - global push-to-talk trigger.
//!
//! A low-level keyboard hook (rdev) feeds raw key transitions into a pure
//! [`ComboTracker`], which reduces them to `Pressed`/`Released` edges of the
//! configured combination. The hook callback does nothing but update the
//! tracker and push edges onto a channel, so the OS hook never stalls.
//!
//! Combinations are parsed from strings like `"Ctrl+Shift+Space"`.
//! Modifier-only combinations (`"Ctrl+Alt"`) are supported, which is the
//! reason for a low-level hook rather than a registration-based hotkey API.

pub mod combo;
pub mod listener;

pub use combo::{parse_combo, HotkeyCombo, KeySpec};
pub use listener::{ComboTracker, HotkeyEvent, HotkeyListener};
