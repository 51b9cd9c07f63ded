//! Recording controller managing the microphone lifecycle for voice answers.
//!
//! One controller serves the whole questionnaire page: a story field hands it
//! a target-field id, the controller records, transcribes, and returns the
//! text to append. Only one recording is active at a time; starting while one
//! is running is rejected by the state machine.
//!
//! Error policy: recoverable failures (permission denial, device trouble,
//! transcription errors) are recorded on `last_error` so the UI can render
//! inline messaging; the state machine always lands back in Idle.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use heirloom_core::error::HeirloomError;
use heirloom_whisper::{ModelLoader, TranscriptionService};

use crate::capture::{ActiveCapture, AudioInput};
use crate::state::{RecorderState, StateMachine};

/// Tracks the data associated with an active recording.
#[derive(Debug)]
pub struct RecordingSession {
    /// Unique identifier for this session.
    pub id: Uuid,
    /// When recording started.
    pub started_at: DateTime<Utc>,
    /// The answer field the finished transcript should be appended to.
    pub target_field: String,
    capture: ActiveCapture,
}

/// A finished transcript, addressed to the field that initiated recording.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceNote {
    pub target_field: String,
    pub text: String,
    pub duration_secs: f32,
}

/// The recording controller.
///
/// Owns the capture device handle for the duration of a session and shares
/// the process-wide model loader with every other controller instance.
pub struct RecordingController<A, M>
where
    A: AudioInput,
    M: TranscriptionService + Send + Sync + 'static,
{
    state: StateMachine,
    audio: A,
    model: Arc<ModelLoader<M>>,
    session: Mutex<Option<RecordingSession>>,
    last_error: Mutex<Option<String>>,
}

impl<A, M> RecordingController<A, M>
where
    A: AudioInput,
    M: TranscriptionService + Send + Sync + 'static,
{
    pub fn new(audio: A, model: Arc<ModelLoader<M>>) -> Self {
        Self {
            state: StateMachine::new(),
            audio,
            model,
            session: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Returns the current recorder state.
    pub fn current_state(&self) -> RecorderState {
        self.state.current()
    }

    /// The most recent recoverable error, for inline UI messaging.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().expect("error mutex poisoned").clone()
    }

    /// The target field of the active session, if one exists.
    pub fn active_target(&self) -> Option<String> {
        self.session
            .lock()
            .expect("session mutex poisoned")
            .as_ref()
            .map(|s| s.target_field.clone())
    }

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Recorder error");
        *self.last_error.lock().expect("error mutex poisoned") = Some(message);
    }

    /// Start recording toward the given answer field.
    ///
    /// Clears any previous error, kicks the shared model load (a load
    /// failure does not block recording; transcription will fail later if
    /// no model is cached), then opens the device. Permission denial and
    /// device failures leave the state at Idle and are recorded as errors.
    pub async fn start_recording(&self, target_field: &str) -> Result<(), HeirloomError> {
        // Reject before opening the device: a second start while a session
        // is active must never acquire a second capture.
        let current = self.state.current();
        if !current.can_transition_to(&RecorderState::Recording) {
            return Err(HeirloomError::Capture(format!(
                "Invalid recorder transition: {} -> {}",
                current,
                RecorderState::Recording
            )));
        }

        *self.last_error.lock().expect("error mutex poisoned") = None;

        if self.model.cached().is_none() {
            if let Err(e) = self.model.load().await {
                tracing::debug!(error = %e, "Model load failed; recording anyway");
            }
        }

        let capture = match self.audio.open().await {
            Ok(capture) => capture,
            Err(HeirloomError::PermissionDenied) => {
                self.set_error("Microphone permission denied. Please allow microphone access.");
                return Err(HeirloomError::PermissionDenied);
            }
            Err(e) => {
                self.set_error(format!("Could not start recording: {}", e));
                return Err(e);
            }
        };

        // Revalidated under the state lock; a racing start that slipped past
        // the guard fails here, and the dropped capture frees the device.
        self.state.transition(RecorderState::Recording)?;

        let session = RecordingSession {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            target_field: target_field.to_string(),
            capture,
        };
        tracing::info!(
            session_id = %session.id,
            target_field = %session.target_field,
            "Recording started"
        );

        *self.session.lock().expect("session mutex poisoned") = Some(session);
        Ok(())
    }

    /// Stop recording and transcribe the captured clip.
    ///
    /// Returns `Ok(None)` when not recording. The device is released before
    /// transcription runs, unconditionally; a transcription failure is
    /// recorded as an error, delivers no text, and still returns the state
    /// machine to Idle.
    pub async fn stop_recording(&self) -> Result<Option<VoiceNote>, HeirloomError> {
        if self.state.current() != RecorderState::Recording {
            return Ok(None);
        }

        let session = self
            .session
            .lock()
            .expect("session mutex poisoned")
            .take();
        let Some(session) = session else {
            self.state.reset();
            return Ok(None);
        };

        self.state.transition(RecorderState::Transcribing)?;

        // Device release happens here, before and regardless of whatever
        // transcription does.
        let samples = session.capture.release();
        let sample_rate = self.audio.sample_rate();
        tracing::info!(
            session_id = %session.id,
            samples = samples.len(),
            "Recording stopped, transcribing"
        );

        let result = match self.model.cached() {
            Some(model) => model.transcribe(&samples, sample_rate).await,
            None => Err(HeirloomError::Transcription(
                "speech model is not loaded".to_string(),
            )),
        };

        self.state.transition(RecorderState::Idle)?;

        match result {
            Ok(transcript) => {
                tracing::info!(
                    text_len = transcript.text.len(),
                    target_field = %session.target_field,
                    "Transcript ready"
                );
                Ok(Some(VoiceNote {
                    target_field: session.target_field,
                    text: transcript.text,
                    duration_secs: transcript.duration_secs,
                }))
            }
            Err(e) => {
                self.set_error(format!("Transcription failed: {}", e));
                Ok(None)
            }
        }
    }

    /// Cancel an active recording, discarding the captured audio and
    /// releasing the device.
    pub fn cancel(&self) -> Result<(), HeirloomError> {
        if self.state.current() != RecorderState::Recording {
            return Err(HeirloomError::Capture(
                "no recording to cancel".to_string(),
            ));
        }

        let session = self
            .session
            .lock()
            .expect("session mutex poisoned")
            .take();
        if let Some(session) = session {
            tracing::info!(session_id = %session.id, "Recording cancelled");
            // Dropping the session releases the capture.
        }
        self.state.transition(RecorderState::Idle)
    }
}

impl<A, M> Drop for RecordingController<A, M>
where
    A: AudioInput,
    M: TranscriptionService + Send + Sync + 'static,
{
    fn drop(&mut self) {
        // Teardown mid-recording must not leave a dangling device lock.
        if let Ok(mut guard) = self.session.lock() {
            if guard.take().is_some() {
                tracing::warn!("Recorder dropped with an active session; device released");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
