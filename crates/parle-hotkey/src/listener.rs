use rdev::{Event, EventType, Key};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::combo::HotkeyCombo;

/// Edge of the configured combination: it became fully held, or it stopped
/// being fully held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    Pressed,
    Released,
}

/// Pure state machine reducing raw key transitions to combination edges.
///
/// Keeps the set of currently held keys and reports `Pressed` exactly once
/// when the combination becomes satisfied, `Released` exactly once when any
/// of its keys goes up. OS key-repeat shows up as duplicate press events for
/// an already-held key and is ignored.
pub struct ComboTracker {
    combo: HotkeyCombo,
    held: Vec<Key>,
    active: bool,
}

impl ComboTracker {
    pub fn new(combo: HotkeyCombo) -> Self {
        Self {
            combo,
            held: Vec::new(),
            active: false,
        }
    }

    pub fn on_key_press(&mut self, key: Key) -> Option<HotkeyEvent> {
        if !self.held.contains(&key) {
            self.held.push(key);
        }
        if !self.active && self.satisfied() {
            self.active = true;
            return Some(HotkeyEvent::Pressed);
        }
        None
    }

    pub fn on_key_release(&mut self, key: Key) -> Option<HotkeyEvent> {
        self.held.retain(|held| *held != key);
        if self.active && !self.satisfied() {
            self.active = false;
            return Some(HotkeyEvent::Released);
        }
        None
    }

    fn satisfied(&self) -> bool {
        self.combo
            .keys
            .iter()
            .all(|spec| self.held.iter().any(|key| spec.matches(*key)))
    }
}

/// Global hotkey listener. Owns a dedicated OS-hook thread and exposes the
/// combination edges as an async stream.
pub struct HotkeyListener {
    receiver: mpsc::UnboundedReceiver<HotkeyEvent>,
}

impl HotkeyListener {
    /// Spawns the low-level keyboard hook for `combo`.
    ///
    /// The hook callback only updates the tracker and pushes edges onto an
    /// unbounded channel. Hook installation failures (e.g. missing input
    /// permissions, Wayland without a compatible portal) are logged from the
    /// hook thread; the listener then simply never yields events.
    pub fn spawn(combo: HotkeyCombo) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("parle-hotkey".to_string())
            .spawn(move || run_hook(combo, sender))
            .map_err(|e| error!(error = %e, "Failed to spawn hotkey thread"))
            .ok();
        Self { receiver }
    }

    /// Waits for the next combination edge. Returns `None` if the hook
    /// thread has shut down.
    pub async fn recv(&mut self) -> Option<HotkeyEvent> {
        self.receiver.recv().await
    }
}

fn run_hook(combo: HotkeyCombo, sender: mpsc::UnboundedSender<HotkeyEvent>) {
    let mut tracker = ComboTracker::new(combo);
    let result = rdev::listen(move |event: Event| {
        let edge = match event.event_type {
            EventType::KeyPress(key) => tracker.on_key_press(key),
            EventType::KeyRelease(key) => tracker.on_key_release(key),
            _ => None,
        };
        if let Some(edge) = edge {
            debug!(?edge, "Hotkey edge");
            // The receiver dropping means the app is shutting down.
            let _ = sender.send(edge);
        }
    });
    if let Err(e) = result {
        error!(error = ?e, "Keyboard hook failed, hotkey is inactive");
    }
}
