//! Shared test doubles for the voice pipeline
//!
//! No audio hardware or platform speech services are involved: capture is
//! scripted, synthesis records what it was asked to say, and the host records
//! submissions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use sauti::{
    CaptureError, CommandHost, ContactVault, Error, IntentParser, MemoryVault, ParsedIntent,
    Result, SpeakOutcome, SpeechCapture, SpeechFeedback, SynthesisBackend, Utterance,
    VoiceCommandController, VoiceContact, VoiceContactStore, VoiceInfo, VoicePreferences,
};

/// Capture that replays scripted outcomes instead of listening
pub struct ScriptedCapture {
    outcomes: Mutex<VecDeque<std::result::Result<String, CaptureError>>>,
    gate: Option<Arc<Notify>>,
    cancels: AtomicUsize,
    supported: bool,
}

impl ScriptedCapture {
    pub fn with_transcript(transcript: &str) -> Self {
        Self::with_outcomes(vec![Ok(transcript.to_string())])
    }

    pub fn with_outcomes(outcomes: Vec<std::result::Result<String, CaptureError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            gate: None,
            cancels: AtomicUsize::new(0),
            supported: true,
        }
    }

    pub fn unsupported() -> Self {
        let mut capture = Self::with_outcomes(vec![]);
        capture.supported = false;
        capture
    }

    /// Hold every `listen` until `release` is notified, simulating a
    /// transcript that arrives late
    pub fn gated(mut self, release: Arc<Notify>) -> Self {
        self.gate = Some(release);
        self
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn listen(&self, _lang: &str) -> std::result::Result<String, CaptureError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CaptureError::NoSpeech))
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Synthesis backend that records utterances instead of speaking
pub struct RecordingBackend {
    utterances: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
    catalog: Vec<VoiceInfo>,
    loaded_catalog: Option<Vec<VoiceInfo>>,
    supported: bool,
    failing: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            utterances: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            catalog: vec![VoiceInfo::new("Samantha", "en-US")],
            loaded_catalog: None,
            supported: true,
            failing: false,
        }
    }

    pub fn with_catalog(catalog: Vec<VoiceInfo>) -> Self {
        Self {
            catalog,
            ..Self::new()
        }
    }

    /// Empty catalog now, `loaded` once the platform finishes loading voices
    pub fn with_delayed_catalog(loaded: Vec<VoiceInfo>) -> Self {
        Self {
            catalog: Vec::new(),
            loaded_catalog: Some(loaded),
            ..Self::new()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.utterances
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn utterances(&self) -> Vec<Utterance> {
        self.utterances.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisBackend for RecordingBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.catalog.clone()
    }

    async fn voices_loaded(&self) -> Vec<VoiceInfo> {
        self.loaded_catalog.clone().unwrap_or_else(|| self.catalog.clone())
    }

    async fn speak(&self, utterance: &Utterance) -> Result<SpeakOutcome> {
        if self.failing {
            return Err(Error::Synthesis("synthesis backend exploded".to_string()));
        }
        self.utterances.lock().unwrap().push(utterance.clone());
        Ok(SpeakOutcome::Completed)
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Host that records submissions and dismissals
#[derive(Default)]
pub struct RecordingHost {
    submissions: Mutex<Vec<ParsedIntent>>,
    dismissals: AtomicUsize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<ParsedIntent> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

impl CommandHost for RecordingHost {
    fn on_submit(&self, intent: ParsedIntent) {
        self.submissions.lock().unwrap().push(intent);
    }

    fn on_dismiss(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }
}

/// Vault whose reads succeed but whose writes always fail
pub struct ReadOnlyVault {
    pub contacts: Vec<VoiceContact>,
}

#[async_trait]
impl ContactVault for ReadOnlyVault {
    async fn load(&self) -> Result<Vec<VoiceContact>> {
        Ok(self.contacts.clone())
    }

    async fn persist(&self, _contacts: &[VoiceContact]) -> Result<()> {
        Err(Error::Storage("vault is read only".to_string()))
    }
}

/// Vault that cannot even be read
pub struct BrokenVault;

#[async_trait]
impl ContactVault for BrokenVault {
    async fn load(&self) -> Result<Vec<VoiceContact>> {
        Err(Error::Storage("vault unavailable".to_string()))
    }

    async fn persist(&self, _contacts: &[VoiceContact]) -> Result<()> {
        Err(Error::Storage("vault unavailable".to_string()))
    }
}

/// A fully wired controller over test doubles
pub struct Harness {
    pub controller: Arc<VoiceCommandController>,
    pub host: Arc<RecordingHost>,
    pub backend: Arc<RecordingBackend>,
}

/// Build a controller with the given capture and stored contacts
pub async fn harness(capture: Arc<dyn SpeechCapture>, contacts: &[VoiceContact]) -> Harness {
    let vault = Arc::new(MemoryVault::new());
    vault.persist(contacts).await.unwrap();

    let store = Arc::new(VoiceContactStore::new(vault));
    store.initialize().await.unwrap();

    harness_with_store(capture, store)
}

/// Build a controller over an explicit contact store
pub fn harness_with_store(
    capture: Arc<dyn SpeechCapture>,
    store: Arc<VoiceContactStore>,
) -> Harness {
    let backend = Arc::new(RecordingBackend::new());
    let feedback = Arc::new(SpeechFeedback::new(
        backend.clone(),
        VoicePreferences::default(),
        0.88,
        1.08,
    ));
    let host = Arc::new(RecordingHost::new());
    let controller = Arc::new(VoiceCommandController::new(
        capture,
        feedback,
        IntentParser::default(),
        store,
        host.clone(),
        "en-US".to_string(),
    ));

    Harness {
        controller,
        host,
        backend,
    }
}
