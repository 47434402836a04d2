//! Session state machine with thread-safe transitions.
//!
//! Enforces the dictation lifecycle:
//! - Idle -> Recording (hotkey pressed)
//! - Recording -> Transcribing (hotkey released, audio captured)
//! - Transcribing -> Formatting (active mode present)
//! - Transcribing -> Pasting (no active mode)
//! - Formatting -> Pasting
//! - Pasting -> Done -> Idle
//! - any active state -> Error -> Idle

use std::sync::{Arc, Mutex};

use parle_core::error::ParleError;
use parle_core::types::DictationState;

fn valid_transition(from: DictationState, to: DictationState) -> bool {
    use DictationState::*;
    matches!(
        (from, to),
        (Idle, Recording)
            | (Recording, Transcribing)
            | (Transcribing, Formatting)
            | (Transcribing, Pasting)
            | (Formatting, Pasting)
            | (Pasting, Done)
            | (Done, Idle)
            | (Error, Idle)
            // Failure transitions from any active state
            | (Recording, Error)
            | (Transcribing, Error)
            | (Formatting, Error)
            | (Pasting, Error)
    )
}

/// Thread-safe state machine for the session lifecycle.
///
/// Transitions are validated atomically under the lock, so a transition
/// doubles as the claim on the session: of two concurrent callers racing
/// for `Idle -> Recording`, exactly one succeeds.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<DictationState>>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DictationState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> DictationState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: DictationState) -> Result<(), ParleError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if valid_transition(*state, target) {
            tracing::debug!("Session state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(ParleError::Session(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state machine back to Idle (error recovery).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != DictationState::Idle {
            tracing::debug!("Session state reset to idle from {}", *state);
        }
        *state = DictationState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use DictationState::*;

    #[test]
    fn test_full_lifecycle_with_formatting() {
        let machine = StateMachine::new();
        for target in [Recording, Transcribing, Formatting, Pasting, Done, Idle] {
            machine.transition(target).unwrap();
        }
        assert_eq!(machine.current(), Idle);
    }

    #[test]
    fn test_lifecycle_skips_formatting_without_mode() {
        let machine = StateMachine::new();
        machine.transition(Recording).unwrap();
        machine.transition(Transcribing).unwrap();
        machine.transition(Pasting).unwrap();
        assert_eq!(machine.current(), Pasting);
    }

    #[test]
    fn test_double_start_is_rejected() {
        let machine = StateMachine::new();
        machine.transition(Recording).unwrap();
        let err = machine.transition(Recording).unwrap_err();
        assert!(err.to_string().contains("recording -> recording"));
    }

    #[test]
    fn test_stop_from_idle_is_rejected() {
        let machine = StateMachine::new();
        assert!(machine.transition(Transcribing).is_err());
        assert_eq!(machine.current(), Idle);
    }

    #[test]
    fn test_error_reachable_from_every_active_state() {
        for path in [
            vec![Recording],
            vec![Recording, Transcribing],
            vec![Recording, Transcribing, Formatting],
            vec![Recording, Transcribing, Formatting, Pasting],
        ] {
            let machine = StateMachine::new();
            for target in path {
                machine.transition(target).unwrap();
            }
            machine.transition(Error).unwrap();
            machine.transition(Idle).unwrap();
        }
    }

    #[test]
    fn test_error_not_reachable_from_idle_or_done() {
        let machine = StateMachine::new();
        assert!(machine.transition(Error).is_err());

        let machine = StateMachine::new();
        for target in [Recording, Transcribing, Pasting, Done] {
            machine.transition(target).unwrap();
        }
        assert!(machine.transition(Error).is_err());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let machine = StateMachine::new();
        machine.transition(Recording).unwrap();
        machine.reset();
        assert_eq!(machine.current(), Idle);
        machine.transition(Recording).unwrap();
    }
}
