//! Speech adapters
//!
//! Platform speech-to-text and text-to-speech sit behind async traits so each
//! target supplies its own backend. Capability checks are explicit queries,
//! and callback-style platform events are folded into single awaited
//! operations with typed outcomes.

mod console;
mod feedback;
mod voices;

use async_trait::async_trait;
use thiserror::Error;

use crate::Result;

pub use console::{ConsoleCapture, ConsolePlayback};
pub use feedback::SpeechFeedback;
pub use voices::{VoiceInfo, VoicePreferences, select_voice};

/// Outcome of one speech capture attempt
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Speech recognition capability is missing
    #[error("speech recognition is not supported on this device")]
    Unsupported,

    /// The utterance window closed without speech
    #[error("no speech detected, please try again")]
    NoSpeech,

    /// Microphone permission denied
    #[error("microphone access was denied, please allow microphone access and try again")]
    PermissionDenied,

    /// Capture was cancelled by the caller; never surfaced to the user
    #[error("speech capture was cancelled")]
    Cancelled,

    /// Any other platform recognition failure
    #[error("speech recognition error: {0}")]
    Other(String),
}

impl From<CaptureError> for crate::Error {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unsupported => Self::UnsupportedCapability,
            CaptureError::NoSpeech => Self::NoSpeechDetected,
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::Cancelled | CaptureError::Other(_) => {
                Self::Recognition(err.to_string())
            }
        }
    }
}

/// Single-utterance speech-to-text capability
///
/// One capture at a time; the command controller never issues a second
/// `listen` while one is in flight.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Whether the platform exposes speech recognition
    fn is_supported(&self) -> bool;

    /// Listen for one utterance and return its final transcript
    ///
    /// Suspends until the platform reports a transcript, an error, or the
    /// capture is cancelled. No transcript is ever delivered after
    /// [`cancel`](Self::cancel).
    async fn listen(&self, lang: &str) -> std::result::Result<String, CaptureError>;

    /// Abort an in-flight capture
    fn cancel(&self);
}

/// One utterance handed to a synthesis backend
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    /// Selected voice; `None` means the platform default
    pub voice: Option<VoiceInfo>,
}

/// How a spoken utterance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Spoken to the end
    Completed,
    /// Silenced by a newer utterance or an explicit cancel; still a success
    Interrupted,
}

/// Text-to-speech capability
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Whether the platform exposes speech synthesis
    fn is_supported(&self) -> bool;

    /// Currently known voices; may be empty while the catalog loads
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Voices once the catalog has finished loading
    async fn voices_loaded(&self) -> Vec<VoiceInfo>;

    /// Speak one utterance to completion or interruption
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Synthesis`] on platform failures; interruption
    /// is reported as [`SpeakOutcome::Interrupted`], not an error
    async fn speak(&self, utterance: &Utterance) -> Result<SpeakOutcome>;

    /// Silence any in-flight utterance
    fn cancel(&self);
}
