//! Recorder state machine with thread-safe transitions.
//!
//! Enforces valid state transitions for a voice-answer recording:
//! - Idle -> Recording (microphone opened)
//! - Recording -> Transcribing (capture stopped, clip handed to the model)
//! - Transcribing -> Idle (transcript delivered or transcription failed)
//! - Recording -> Idle (recording cancelled)
//!
//! Failures do not get their own state; they are recorded as an error field
//! on the controller and the machine returns to Idle.

use std::fmt;
use std::sync::{Arc, Mutex};

use heirloom_core::error::HeirloomError;

/// Operational state of the recording controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecorderState {
    /// No recording in progress. Ready to start.
    Idle,
    /// Actively buffering microphone audio.
    Recording,
    /// Running the captured clip through the transcription engine.
    Transcribing,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderState::Idle => write!(f, "Idle"),
            RecorderState::Recording => write!(f, "Recording"),
            RecorderState::Transcribing => write!(f, "Transcribing"),
        }
    }
}

impl RecorderState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &RecorderState) -> bool {
        matches!(
            (self, target),
            (RecorderState::Idle, RecorderState::Recording)
                | (RecorderState::Recording, RecorderState::Transcribing)
                | (RecorderState::Transcribing, RecorderState::Idle)
                // Cancel
                | (RecorderState::Recording, RecorderState::Idle)
        )
    }
}

/// Thread-safe state machine for recorder transitions.
///
/// All transitions are validated before being applied, returning an error
/// if the requested transition is not permitted.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<RecorderState>>,
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
            state: Arc::new(Mutex::new(RecorderState::Idle)),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> RecorderState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: RecorderState) -> Result<(), HeirloomError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Recorder state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(HeirloomError::Capture(format!(
                "Invalid recorder transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state machine back to Idle (used for error recovery).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != RecorderState::Idle {
            tracing::warn!("Recorder state machine reset to Idle from {}", *state);
        }
        *state = RecorderState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(RecorderState::Idle.to_string(), "Idle");
        assert_eq!(RecorderState::Recording.to_string(), "Recording");
        assert_eq!(RecorderState::Transcribing.to_string(), "Transcribing");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(RecorderState::Idle.can_transition_to(&RecorderState::Recording));
        assert!(RecorderState::Recording.can_transition_to(&RecorderState::Transcribing));
        assert!(RecorderState::Transcribing.can_transition_to(&RecorderState::Idle));
        // Cancel
        assert!(RecorderState::Recording.can_transition_to(&RecorderState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip states
        assert!(!RecorderState::Idle.can_transition_to(&RecorderState::Transcribing));
        // Cannot go backwards
        assert!(!RecorderState::Transcribing.can_transition_to(&RecorderState::Recording));
        // Cannot transition to self
        assert!(!RecorderState::Idle.can_transition_to(&RecorderState::Idle));
        assert!(!RecorderState::Recording.can_transition_to(&RecorderState::Recording));
        // Transcribing cannot be cancelled back into Recording
        assert!(!RecorderState::Transcribing.can_transition_to(&RecorderState::Transcribing));
    }

    #[test]
    fn test_state_machine_happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), RecorderState::Idle);

        sm.transition(RecorderState::Recording).unwrap();
        sm.transition(RecorderState::Transcribing).unwrap();
        sm.transition(RecorderState::Idle).unwrap();
        assert_eq!(sm.current(), RecorderState::Idle);
    }

    #[test]
    fn test_state_machine_cancel_from_recording() {
        let sm = StateMachine::new();
        sm.transition(RecorderState::Recording).unwrap();
        sm.transition(RecorderState::Idle).unwrap();
        assert_eq!(sm.current(), RecorderState::Idle);
    }

    #[test]
    fn test_state_machine_invalid_transition() {
        let sm = StateMachine::new();
        let result = sm.transition(RecorderState::Transcribing);
        assert!(result.is_err());
        assert_eq!(sm.current(), RecorderState::Idle);
    }

    #[test]
    fn test_state_machine_reset() {
        let sm = StateMachine::new();
        sm.transition(RecorderState::Recording).unwrap();
        sm.reset();
        assert_eq!(sm.current(), RecorderState::Idle);
    }

    #[test]
    fn test_state_machine_clone_is_shared() {
        let sm1 = StateMachine::new();
        let sm2 = sm1.clone();
        sm1.transition(RecorderState::Recording).unwrap();
        assert_eq!(sm2.current(), RecorderState::Recording);
    }
}
