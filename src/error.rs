//! Error types for the Sauti gateway

use thiserror::Error;

/// Result type alias for Sauti operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Sauti gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Speech recognition capability is missing on this platform
    #[error("speech recognition is not supported on this device")]
    UnsupportedCapability,

    /// The capture window closed without any speech
    #[error("no speech detected, please try again")]
    NoSpeechDetected,

    /// Microphone permission was denied by the user or platform
    #[error("microphone access was denied, please allow microphone access and try again")]
    PermissionDenied,

    /// Any other speech recognition failure
    #[error("speech recognition error: {0}")]
    Recognition(String),

    /// The transcript could not be parsed into a command
    #[error("could not understand the command: {0}")]
    Parse(String),

    /// The recipient name did not match any stored contact
    #[error("no voice contact named \"{0}\"")]
    ResolutionAmbiguous(String),

    /// Bad contact form or duplicate name
    #[error("invalid contact: {0}")]
    Validation(String),

    /// Contact vault read/write failure
    #[error("contact storage error: {0}")]
    Storage(String),

    /// Speech synthesis error (interruption is not an error)
    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
