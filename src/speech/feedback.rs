//! Spoken feedback with single-flight discipline
//!
//! [`SpeechFeedback`] owns the one audio output channel: any in-flight
//! utterance is silenced before a new one starts, and concurrent speakers are
//! serialized. Interruption counts as successful completion.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::voices::{VoicePreferences, select_voice};
use super::{SpeakOutcome, SynthesisBackend, Utterance};
use crate::{Error, Result};

/// Speaks prompts through a synthesis backend, one utterance at a time
pub struct SpeechFeedback {
    backend: Arc<dyn SynthesisBackend>,
    prefs: VoicePreferences,
    rate: f32,
    pitch: f32,
    flight: Mutex<()>,
}

impl SpeechFeedback {
    /// Create a feedback channel over a backend
    #[must_use]
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        prefs: VoicePreferences,
        rate: f32,
        pitch: f32,
    ) -> Self {
        Self {
            backend,
            prefs,
            rate,
            pitch,
            flight: Mutex::new(()),
        }
    }

    /// Whether speech synthesis is available
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    /// Speak `text`, silencing any utterance already in flight
    ///
    /// Voice selection runs against the current catalog; if the catalog has
    /// not loaded yet, one retry is made once it is ready. Interruption by a
    /// newer utterance completes successfully.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCapability`] when the platform has no
    /// synthesis, or [`Error::Synthesis`] on platform failures
    pub async fn speak(&self, text: &str, lang: &str) -> Result<()> {
        if !self.backend.is_supported() {
            return Err(Error::UnsupportedCapability);
        }

        // Only one utterance active at a time
        self.backend.cancel();
        let _flight = self.flight.lock().await;

        let mut voice = select_voice(&self.backend.voices(), lang, &self.prefs);
        if voice.is_none() {
            // Catalogs can load after capability init; retry once they have
            voice = select_voice(&self.backend.voices_loaded().await, lang, &self.prefs);
        }

        let utterance = Utterance {
            text: text.to_string(),
            lang: lang.to_string(),
            rate: self.rate,
            pitch: self.pitch,
            voice,
        };

        tracing::debug!(text, voice = ?utterance.voice.as_ref().map(|v| &v.name), "speaking");
        match self.backend.speak(&utterance).await? {
            SpeakOutcome::Completed => tracing::debug!("utterance complete"),
            SpeakOutcome::Interrupted => tracing::debug!("utterance interrupted"),
        }
        Ok(())
    }

    /// Silence any in-flight utterance
    pub fn cancel(&self) {
        self.backend.cancel();
    }
}
