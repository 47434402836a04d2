//! Parle paste crate - clipboard-safe text insertion into the focused app.
//!
//! The clipboard is global OS state that other applications write to
//! concurrently, so insertion follows an explicit ownership protocol:
//! snapshot, write the transcript, inject the platform paste keystroke,
//! check freshness, and restore the snapshot only if nothing external wrote
//! the clipboard in the meantime. Clipboard access failures and keystroke
//! injection failures are distinct error kinds.

pub mod clipboard;
pub mod coordinator;
pub mod inject;

pub use clipboard::{Clipboard, SystemClipboard};
pub use coordinator::{ClipboardCoordinator, Paster, SystemPaster};
pub use inject::{EnigoInjector, KeystrokeInjector};
