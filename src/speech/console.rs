//! Console speech adapters
//!
//! Stand-ins for platform speech hardware: the capture reads one line from
//! stdin as the "utterance" and the playback prints spoken text. They let the
//! full pipeline run interactively on any machine.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;

use super::voices::VoiceInfo;
use super::{CaptureError, SpeakOutcome, SpeechCapture, SynthesisBackend, Utterance};
use crate::Result;

/// Reads one line from stdin per capture
#[derive(Default)]
pub struct ConsoleCapture {
    cancel_signal: Notify,
}

impl ConsoleCapture {
    /// Create a console capture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpeechCapture for ConsoleCapture {
    fn is_supported(&self) -> bool {
        true
    }

    async fn listen(&self, lang: &str) -> std::result::Result<String, CaptureError> {
        println!("(listening, {lang}) type your command:");

        let mut reader = BufReader::new(tokio::io::stdin());
        let mut line = String::new();

        tokio::select! {
            read = reader.read_line(&mut line) => match read {
                Ok(0) => Err(CaptureError::NoSpeech),
                Ok(_) => {
                    let transcript = line.trim();
                    if transcript.is_empty() {
                        Err(CaptureError::NoSpeech)
                    } else {
                        Ok(transcript.to_string())
                    }
                }
                Err(e) => Err(CaptureError::Other(e.to_string())),
            },
            () = self.cancel_signal.notified() => Err(CaptureError::Cancelled),
        }
    }

    fn cancel(&self) {
        self.cancel_signal.notify_waiters();
    }
}

/// Prints spoken text to stdout
pub struct ConsolePlayback {
    catalog: Vec<VoiceInfo>,
}

impl ConsolePlayback {
    /// Create a console playback with a single generic voice
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: vec![VoiceInfo::new("Console", "en-US")],
        }
    }
}

impl Default for ConsolePlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisBackend for ConsolePlayback {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.catalog.clone()
    }

    async fn voices_loaded(&self) -> Vec<VoiceInfo> {
        self.catalog.clone()
    }

    async fn speak(&self, utterance: &Utterance) -> Result<SpeakOutcome> {
        println!("🔊 {}", utterance.text);
        Ok(SpeakOutcome::Completed)
    }

    fn cancel(&self) {}
}
