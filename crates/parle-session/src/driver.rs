//! Maps hotkey edges onto session operations.

use std::sync::Arc;

use tracing::{debug, info, warn};

use parle_core::error::ParleError;
use parle_core::settings::HotkeyMode;
use parle_core::types::DictationState;
use parle_hotkey::HotkeyEvent;

use crate::manager::DictationSessionManager;

/// Translates combination edges into `start`/`stop_and_transcribe` calls.
///
/// Hold mode: press starts, release stops. Toggle mode: each press
/// alternates based on the current state, releases are ignored. The stop
/// pipeline is spawned rather than awaited so the event loop keeps draining
/// edges while transcription runs; the manager rejects any that overlap.
pub struct HotkeyDriver {
    manager: Arc<DictationSessionManager>,
    mode: HotkeyMode,
}

impl HotkeyDriver {
    pub fn new(manager: Arc<DictationSessionManager>, mode: HotkeyMode) -> Self {
        Self { manager, mode }
    }

    pub fn handle(&self, event: HotkeyEvent) {
        match (self.mode, event) {
            (HotkeyMode::Hold, HotkeyEvent::Pressed) => self.begin(),
            (HotkeyMode::Hold, HotkeyEvent::Released) => self.finish(),
            (HotkeyMode::Toggle, HotkeyEvent::Pressed) => {
                if self.manager.state() == DictationState::Recording {
                    self.finish();
                } else {
                    self.begin();
                }
            }
            (HotkeyMode::Toggle, HotkeyEvent::Released) => {}
        }
    }

    fn begin(&self) {
        match self.manager.start() {
            Ok(()) => {}
            Err(ParleError::AlreadyRecording) => {
                debug!("Session already in flight, press ignored")
            }
            Err(e) => warn!(error = %e, "Failed to start recording"),
        }
    }

    fn finish(&self) {
        let manager = self.manager.clone();
        tokio::spawn(async move {
            match manager.stop_and_transcribe().await {
                Ok(text) => info!(chars = text.len(), "Dictation pasted"),
                Err(ParleError::NotRecording) => {
                    debug!("No recording in flight, release ignored")
                }
                Err(e) => warn!(error = %e, "Dictation session failed"),
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
