//! Heirloom Whisper crate - on-device speech-to-text for voice answers.
//!
//! Provides a trait-based abstraction for transcription, a single-flight
//! model loader shared process-wide, and a mock implementation for testing
//! without loading a real Whisper model.

use std::future::Future;

use heirloom_core::error::HeirloomError;

pub mod loader;
pub mod whisper_service;

pub use loader::{LoadPhase, LoadStatus, ModelFetchFn, ModelLoader, ProgressHandle};
pub use whisper_service::WhisperService;

// =============================================================================
// Result type
// =============================================================================

/// The outcome of one transcription call.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Full transcribed text.
    pub text: String,
    /// Total audio duration in seconds.
    pub duration_secs: f32,
}

// =============================================================================
// Trait
// =============================================================================

/// Service for transcribing a recorded clip to text.
///
/// Implementations accept raw PCM samples and return the transcript that the
/// recording controller delivers back to the answer field.
pub trait TranscriptionService: Send + Sync {
    /// Transcribe audio data into text.
    ///
    /// # Arguments
    /// * `audio_data` - PCM audio samples as f32 values in [-1.0, 1.0].
    /// * `sample_rate` - Sample rate of the audio data in Hz (e.g., 16000).
    fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> impl Future<Output = Result<Transcript, HeirloomError>> + Send;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock transcription service that returns a fixed transcript.
///
/// Used for testing and development without requiring a real Whisper model.
/// Can be configured to fail, for exercising the recorder's error path.
#[derive(Debug, Clone)]
pub struct MockTranscriptionService {
    text: String,
    fail: bool,
}

impl Default for MockTranscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscriptionService {
    pub fn new() -> Self {
        Self {
            text: "[mock transcript]".to_string(),
            fail: false,
        }
    }

    /// Mock that returns the given text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
        }
    }

    /// Mock that fails every call.
    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, HeirloomError> {
        if self.fail {
            return Err(HeirloomError::Transcription(
                "mock transcription failure".to_string(),
            ));
        }

        if audio_data.is_empty() {
            return Err(HeirloomError::Transcription(
                "Cannot transcribe empty audio data".to_string(),
            ));
        }

        if sample_rate == 0 {
            return Err(HeirloomError::Transcription(
                "Sample rate must be greater than 0".to_string(),
            ));
        }

        let duration_secs = audio_data.len() as f32 / sample_rate as f32;
        tracing::debug!(duration_secs, sample_rate, "Mock transcript generated");

        Ok(Transcript {
            text: self.text.clone(),
            duration_secs,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
