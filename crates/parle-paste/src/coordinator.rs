use std::time::Duration;

use tracing::{debug, info, warn};

use parle_core::error::{ParleError, Result};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::inject::{EnigoInjector, KeystrokeInjector};

/// Attempts for each clipboard read/write before giving up. The clipboard
/// can be transiently held by another process; never block indefinitely.
const CLIPBOARD_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);
/// Delay between writing the clipboard and injecting the keystroke (and
/// again before restoring), giving the target app time to observe the write.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Port consumed by the session manager: insert `text` into the focused
/// application, restoring the user's clipboard afterwards unless told to
/// leave the transcript behind.
pub trait Paster: Send + Sync {
    fn paste(&self, text: &str, restore_clipboard: bool) -> Result<()>;
}

/// Drives the paste sub-protocol over a clipboard and a keystroke injector.
///
/// Protocol: snapshot the clipboard, write the transcript, inject the paste
/// chord, then re-read the clipboard as a freshness check. The snapshot is
/// restored only when the clipboard still holds exactly what we wrote;
/// anything else means an external actor wrote it in the meantime, and
/// clobbering their content would be worse than leaving the transcript.
pub struct ClipboardCoordinator<C: Clipboard, K: KeystrokeInjector> {
    clipboard: C,
    injector: K,
    settle_delay: Duration,
    retry_backoff: Duration,
}

impl<C: Clipboard, K: KeystrokeInjector> ClipboardCoordinator<C, K> {
    pub fn new(clipboard: C, injector: K) -> Self {
        Self {
            clipboard,
            injector,
            settle_delay: SETTLE_DELAY,
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Override the protocol delays. Tests use zero delays.
    pub fn with_timing(mut self, settle_delay: Duration, retry_backoff: Duration) -> Self {
        self.settle_delay = settle_delay;
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn paste(&mut self, text: &str, restore_clipboard: bool) -> Result<()> {
        let snapshot = if restore_clipboard {
            self.get_text_with_retries()?
        } else {
            None
        };

        self.set_text_with_retries(text)?;
        std::thread::sleep(self.settle_delay);

        if let Err(e) = self.injector.send_paste() {
            // Injection failed; put the clipboard back in the best
            // achievable state before surfacing the error.
            if restore_clipboard {
                if let Err(restore_err) = self.restore_if_unchanged(text, snapshot) {
                    warn!(error = %restore_err, "Failed to restore clipboard after injection failure");
                }
            }
            return Err(e);
        }

        if restore_clipboard {
            std::thread::sleep(self.settle_delay);
            self.restore_if_unchanged(text, snapshot)?;
        } else {
            debug!("Leaving transcript on the clipboard (copy_to_clipboard_on_success)");
        }

        Ok(())
    }

    /// Restore `snapshot` only if the clipboard still holds `written`.
    fn restore_if_unchanged(&mut self, written: &str, snapshot: Option<String>) -> Result<()> {
        let current = self.get_text_with_retries()?;
        if current.as_deref() != Some(written) {
            info!("Clipboard was written externally during paste, skipping restore");
            return Ok(());
        }
        match snapshot {
            Some(previous) => self.set_text_with_retries(&previous),
            None => {
                // Nothing text-shaped to restore; the transcript stays.
                debug!("No text snapshot to restore");
                Ok(())
            }
        }
    }

    fn get_text_with_retries(&mut self) -> Result<Option<String>> {
        self.with_retries(|clipboard| clipboard.get_text())
    }

    fn set_text_with_retries(&mut self, text: &str) -> Result<()> {
        self.with_retries(|clipboard| clipboard.set_text(text))
    }

    fn with_retries<T>(&mut self, mut op: impl FnMut(&mut C) -> Result<T>) -> Result<T> {
        let mut last_error = None;
        for attempt in 1..=CLIPBOARD_ATTEMPTS {
            match op(&mut self.clipboard) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(attempt, error = %e, "Clipboard access failed");
                    last_error = Some(e);
                    if attempt < CLIPBOARD_ATTEMPTS {
                        std::thread::sleep(self.retry_backoff);
                    }
                }
            }
        }
        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(ParleError::Clipboard(format!(
            "Clipboard unavailable after {CLIPBOARD_ATTEMPTS} attempts: {cause}"
        )))
    }
}

/// System implementation of [`Paster`]: arboard clipboard + enigo keystrokes.
///
/// OS handles are opened per call rather than held, so the paster itself is
/// freely shareable across threads.
pub struct SystemPaster;

impl Paster for SystemPaster {
    fn paste(&self, text: &str, restore_clipboard: bool) -> Result<()> {
        let clipboard = SystemClipboard::new()?;
        let mut coordinator = ClipboardCoordinator::new(clipboard, EnigoInjector::new());
        coordinator.paste(text, restore_clipboard)
    }
}
