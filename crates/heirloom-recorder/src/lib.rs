//! Heirloom Recorder crate - microphone session lifecycle for voice answers.
//!
//! Manages the capture device through a strict state machine
//! (Idle -> Recording -> Transcribing -> Idle) and hands finished clips to
//! the shared transcription model. Device release is unconditional on every
//! exit path.

pub mod capture;
pub mod controller;
pub mod state;

pub use capture::{ActiveCapture, AudioInput, MockAudioInput, MockInputMode};
pub use controller::{RecordingController, RecordingSession, VoiceNote};
pub use state::{RecorderState, StateMachine};
