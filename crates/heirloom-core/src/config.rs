use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HeirloomError, Result};

/// Top-level configuration for the Heirloom application.
///
/// Loaded from `~/.heirloom/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeirloomConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub questionnaire: QuestionnaireConfig,
    #[serde(default)]
    pub whisper: WhisperConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl HeirloomConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HeirloomConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HeirloomError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.heirloom/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Questionnaire flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireConfig {
    /// Soft time budget for a fresh submission, in seconds.
    pub time_budget_secs: u32,
}

impl Default for QuestionnaireConfig {
    fn default() -> Self {
        Self {
            // Two hours, matching the guided-writing session the product sells.
            time_budget_secs: 7200,
        }
    }
}

/// Speech-to-text model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Path to the Whisper GGML model file.
    pub model_path: String,
    /// Language code for transcription (e.g., "en", "auto").
    pub language: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            language: "en".to_string(),
        }
    }
}

/// Microphone capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Size of each buffered audio slice in milliseconds.
    pub chunk_ms: u32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_ms: 1000,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Port the beacon/admin API listens on.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 4040 }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HeirloomConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.questionnaire.time_budget_secs, 7200);
        assert_eq!(config.recorder.sample_rate, 16000);
        assert_eq!(config.recorder.chunk_ms, 1000);
        assert_eq!(config.api.port, 4040);
        assert_eq!(config.whisper.language, "en");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = HeirloomConfig::default();
        config.questionnaire.time_budget_secs = 600;
        config.whisper.model_path = "/models/ggml-base.en.bin".to_string();
        config.save(&path).unwrap();

        let loaded = HeirloomConfig::load(&path).unwrap();
        assert_eq!(loaded.questionnaire.time_budget_secs, 600);
        assert_eq!(loaded.whisper.model_path, "/models/ggml-base.en.bin");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = HeirloomConfig::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = HeirloomConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.api.port, 4040);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[questionnaire]\ntime_budget_secs = 90\n").unwrap();

        let config = HeirloomConfig::load(&path).unwrap();
        assert_eq!(config.questionnaire.time_budget_secs, 90);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_load_or_default_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not toml [[[").unwrap();

        let config = HeirloomConfig::load_or_default(&path);
        assert_eq!(config.recorder.sample_rate, 16000);
    }
}
