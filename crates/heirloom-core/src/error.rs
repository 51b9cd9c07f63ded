use thiserror::Error;

/// Top-level error type for the Heirloom system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates construct
/// the matching variant directly so that the `?` operator works across crate
/// boundaries without adapter layers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeirloomError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Questionnaire error: {0}")]
    Questionnaire(String),

    #[error("Timer error: {0}")]
    Timer(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for HeirloomError {
    fn from(err: toml::de::Error) -> Self {
        HeirloomError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HeirloomError {
    fn from(err: toml::ser::Error) -> Self {
        HeirloomError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HeirloomError {
    fn from(err: serde_json::Error) -> Self {
        HeirloomError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Heirloom operations.
pub type Result<T> = std::result::Result<T, HeirloomError>;
