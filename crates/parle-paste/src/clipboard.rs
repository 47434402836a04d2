use parle_core::error::{ParleError, Result};

/// Minimal clipboard access port.
///
/// `get_text` returns `None` when the clipboard holds no text content
/// (empty, or an image); that is not an error. Errors mean the clipboard
/// itself could not be accessed, e.g. it is held by another process.
pub trait Clipboard: Send {
    fn get_text(&mut self) -> Result<Option<String>>;
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard backed by arboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| ParleError::Clipboard(format!("Failed to open clipboard: {e}")))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Result<Option<String>> {
        match self.inner.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(ParleError::Clipboard(e.to_string())),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ParleError::Clipboard(e.to_string()))
    }
}
