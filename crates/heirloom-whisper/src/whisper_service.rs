//! Real Whisper transcription service via whisper-rs (whisper.cpp bindings).
//!
//! When compiled with the `whisper` feature, loads a GGML model file and runs
//! speech-to-text inference on raw PCM audio. Without the feature, provides a
//! stub that fails at call time so the rest of the system still builds.

#[cfg(feature = "whisper")]
use std::path::Path;

use heirloom_core::config::WhisperConfig;
use heirloom_core::error::HeirloomError;

use crate::loader::{ModelFetchFn, ModelLoader};
use crate::{Transcript, TranscriptionService};

/// Real Whisper transcription service backed by whisper.cpp.
///
/// Holds a loaded model context reused across transcription calls. This is
/// the instance the process-wide [`ModelLoader`] caches.
pub struct WhisperService {
    #[cfg(feature = "whisper")]
    ctx: whisper_rs::WhisperContext,
    config: WhisperConfig,
}

impl WhisperService {
    /// Create a new WhisperService by loading a GGML model file.
    ///
    /// # Errors
    /// Returns `HeirloomError::Model` if the model file doesn't exist or
    /// fails to load.
    #[cfg(feature = "whisper")]
    pub fn new(config: WhisperConfig) -> Result<Self, HeirloomError> {
        use whisper_rs::{WhisperContext, WhisperContextParameters};

        let model_path = &config.model_path;
        if !Path::new(model_path).exists() {
            return Err(HeirloomError::Model(format!(
                "Whisper model file not found: {}",
                model_path
            )));
        }

        tracing::info!(model = %model_path, lang = %config.language, "Loading Whisper model");

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, params)
            .map_err(|e| HeirloomError::Model(format!("Failed to load Whisper model: {}", e)))?;

        Ok(Self { ctx, config })
    }

    /// Stub constructor when the `whisper` feature is disabled.
    #[cfg(not(feature = "whisper"))]
    pub fn new(config: WhisperConfig) -> Result<Self, HeirloomError> {
        tracing::warn!("WhisperService created without `whisper` feature — transcription will fail");
        Ok(Self { config })
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// A fetch function for [`ModelLoader`] that constructs this service.
    ///
    /// Model initialization is one opaque step, so progress jumps straight
    /// to done when the context is built.
    pub fn fetch_fn(config: WhisperConfig) -> ModelFetchFn<WhisperService> {
        Box::new(move |progress| {
            let config = config.clone();
            Box::pin(async move {
                let service = WhisperService::new(config)?;
                progress.done();
                Ok(service)
            })
        })
    }

    /// Convenience constructor for the shared loader.
    pub fn loader(config: WhisperConfig) -> ModelLoader<WhisperService> {
        ModelLoader::new(Self::fetch_fn(config))
    }
}

// ---------------------------------------------------------------------------
// Real implementation (whisper feature enabled)
// ---------------------------------------------------------------------------

#[cfg(feature = "whisper")]
impl TranscriptionService for WhisperService {
    async fn transcribe(
        &self,
        audio_data: &[f32],
        sample_rate: u32,
    ) -> Result<Transcript, HeirloomError> {
        use whisper_rs::{FullParams, SamplingStrategy};

        if audio_data.is_empty() {
            return Err(HeirloomError::Transcription(
                "Cannot transcribe empty audio data".into(),
            ));
        }

        if sample_rate == 0 {
            return Err(HeirloomError::Transcription(
                "Sample rate must be greater than 0".into(),
            ));
        }

        // Whisper expects 16 kHz mono PCM. Resample if needed.
        let samples_16k = if sample_rate != 16000 {
            resample(audio_data, sample_rate, 16000)
        } else {
            audio_data.to_vec()
        };

        let duration_secs = samples_16k.len() as f32 / 16000.0;
        tracing::debug!(samples = samples_16k.len(), duration_secs, "Starting transcription");

        let mut state = self.ctx.create_state().map_err(|e| {
            HeirloomError::Transcription(format!("Failed to create Whisper state: {}", e))
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        let lang = if self.config.language == "auto" {
            None
        } else {
            Some(self.config.language.as_str())
        };
        params.set_language(lang);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples_16k)
            .map_err(|e| HeirloomError::Transcription(format!("Whisper inference failed: {}", e)))?;

        let n_segments = state.full_n_segments().map_err(|e| {
            HeirloomError::Transcription(format!("Failed to get segment count: {}", e))
        })?;

        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                HeirloomError::Transcription(format!("Failed to get segment {} text: {}", i, e))
            })?;
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(segment.trim());
        }

        tracing::info!(segments = n_segments, text_len = text.len(), "Transcription complete");

        Ok(Transcript {
            text,
            duration_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Stub implementation (whisper feature disabled)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "whisper"))]
impl TranscriptionService for WhisperService {
    async fn transcribe(
        &self,
        _audio_data: &[f32],
        _sample_rate: u32,
    ) -> Result<Transcript, HeirloomError> {
        Err(HeirloomError::Transcription(
            "Whisper transcription requires the `whisper` feature to be enabled".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Resampling helper
// ---------------------------------------------------------------------------

/// Simple linear resampling from one sample rate to another.
///
/// Linear interpolation is sufficient for Whisper input, which is already
/// low-frequency speech.
#[cfg(feature = "whisper")]
fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (input.len() as f64 / ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let idx1 = (idx0 + 1).min(input.len() - 1);
        let frac = (src_idx - idx0 as f64) as f32;

        output.push(input[idx0] * (1.0 - frac) + input[idx1] * frac);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_service_no_model_file() {
        let config = WhisperConfig {
            model_path: "/nonexistent/model.bin".to_string(),
            language: "en".to_string(),
        };
        let result = WhisperService::new(config);
        // Without whisper feature: succeeds (stub). With: fails (no file).
        #[cfg(feature = "whisper")]
        assert!(result.is_err());
        #[cfg(not(feature = "whisper"))]
        assert!(result.is_ok());
    }

    #[cfg(not(feature = "whisper"))]
    #[tokio::test]
    async fn test_whisper_service_stub_returns_error() {
        let service = WhisperService::new(WhisperConfig::default()).unwrap();
        let audio = vec![0.0f32; 16000];
        let result = service.transcribe(&audio, 16000).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("whisper"));
    }

    #[cfg(not(feature = "whisper"))]
    #[tokio::test]
    async fn test_loader_caches_stub_service() {
        let loader = WhisperService::loader(WhisperConfig::default());
        let a = loader.load().await.unwrap();
        let b = loader.load().await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert_eq!(a.config().language, "en");
    }

    #[cfg(feature = "whisper")]
    #[tokio::test]
    async fn test_loader_missing_model_is_retryable() {
        let config = WhisperConfig {
            model_path: "/nonexistent/model.bin".to_string(),
            language: "en".to_string(),
        };
        let loader = WhisperService::loader(config);
        assert!(loader.load().await.is_err());
        // Error state is recoverable; the next call attempts a fresh load.
        assert!(loader.load().await.is_err());
    }
}
