//! Voice command state machine
//!
//! [`VoiceCommandController`] drives one utterance through capture, parsing,
//! recipient resolution, and a confirm/cancel exchange, speaking feedback at
//! each step. Nothing in this module moves money: a confirmed intent is
//! handed to the host's submit callback and that is the end of the pipeline.
//!
//! Every pipeline run carries a session token. Stages re-check the token
//! after each suspension point, so a transcript or resolution that lands
//! after `cancel()` is discarded instead of transitioning state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::Error;
use crate::contacts::{self, VoiceContactStore};
use crate::intent::{IntentParser, ParsedIntent};
use crate::speech::{CaptureError, SpeechCapture, SpeechFeedback};

/// States of one voice command session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// No session active
    Idle,
    /// Waiting for the utterance transcript
    Listening,
    /// Parsing and resolving the transcript
    Parsing,
    /// Pending intent exposed, waiting for confirm or cancel
    AwaitingConfirmation,
    /// Intent emitted to the host; transitional, resets to idle
    Confirmed,
    /// Pending intent discarded; transitional, resets to idle
    Cancelled,
    /// Failed with a user-facing message; recovered by a fresh `start()`
    Error,
}

/// Snapshot of the active session exposed to the UI
#[derive(Debug, Clone)]
pub struct CommandSession {
    pub state: CommandState,
    pub transcript: Option<String>,
    pub pending_intent: Option<ParsedIntent>,
    pub error_message: Option<String>,
    token: u64,
}

impl CommandSession {
    fn idle() -> Self {
        Self {
            state: CommandState::Idle,
            transcript: None,
            pending_intent: None,
            error_message: None,
            token: 0,
        }
    }

    fn listening(token: u64) -> Self {
        Self {
            state: CommandState::Listening,
            transcript: None,
            pending_intent: None,
            error_message: None,
            token,
        }
    }
}

/// Callbacks into the hosting UI
pub trait CommandHost: Send + Sync {
    /// A resolved intent was confirmed; the host performs the transfer
    fn on_submit(&self, intent: ParsedIntent);

    /// The session was dismissed without a submission
    fn on_dismiss(&self);
}

/// Orchestrates capture, parsing, resolution, and confirmation
pub struct VoiceCommandController {
    capture: Arc<dyn SpeechCapture>,
    feedback: Arc<SpeechFeedback>,
    parser: IntentParser,
    store: Arc<VoiceContactStore>,
    host: Arc<dyn CommandHost>,
    lang: String,
    session: Mutex<CommandSession>,
    generation: AtomicU64,
}

impl VoiceCommandController {
    /// Create a controller wired to its collaborators
    #[must_use]
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        feedback: Arc<SpeechFeedback>,
        parser: IntentParser,
        store: Arc<VoiceContactStore>,
        host: Arc<dyn CommandHost>,
        lang: String,
    ) -> Self {
        Self {
            capture,
            feedback,
            parser,
            store,
            host,
            lang,
            session: Mutex::new(CommandSession::idle()),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether speech input is available at all
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.capture.is_supported()
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> CommandState {
        self.session
            .lock()
            .map_or(CommandState::Error, |s| s.state)
    }

    /// Snapshot of the whole session for the UI
    #[must_use]
    pub fn session(&self) -> CommandSession {
        self.session
            .lock()
            .map_or_else(|_| CommandSession::idle(), |s| s.clone())
    }

    /// Pending intent, present only while awaiting confirmation
    #[must_use]
    pub fn pending_intent(&self) -> Option<ParsedIntent> {
        self.session
            .lock()
            .ok()
            .and_then(|s| s.pending_intent.clone())
    }

    /// User-facing message for the error state
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.session.lock().ok().and_then(|s| s.error_message.clone())
    }

    /// Run one capture-parse-resolve pass, ending in `AwaitingConfirmation`
    /// or `Error`
    ///
    /// Ignored unless the session is idle (or recovering from an error): a
    /// human speaks once per turn, so a second `start()` mid-session is
    /// dropped rather than queued. Pipeline failures surface through the
    /// session's error state, never as a panic or return value.
    pub async fn start(&self) {
        let Some(token) = self.begin_session() else {
            return;
        };

        if !self.capture.is_supported() {
            self.fail(token, &Error::UnsupportedCapability).await;
            return;
        }

        tracing::info!(lang = %self.lang, "listening for command");
        let transcript = match self.capture.listen(&self.lang).await {
            Ok(transcript) => transcript,
            Err(CaptureError::Cancelled) => {
                tracing::debug!("capture cancelled");
                return;
            }
            Err(e) => {
                self.fail(token, &Error::from(e)).await;
                return;
            }
        };

        if !self.advance(token, |session| {
            session.state = CommandState::Parsing;
            session.transcript = Some(transcript.clone());
        }) {
            tracing::debug!("discarding transcript for superseded session");
            return;
        }
        tracing::info!(transcript = %transcript, "transcript received");

        let mut intent = self.parser.parse(&transcript);
        if !intent.is_actionable() {
            let reason = intent
                .failure_reason
                .take()
                .unwrap_or_else(|| "could not understand the command".to_string());
            self.fail(token, &Error::Parse(reason)).await;
            return;
        }

        if intent.resolved_phone.is_none() {
            if let Err(e) = self.store.initialize().await {
                self.fail(token, &e).await;
                return;
            }
            match contacts::resolve(&intent.recipient_token, &self.store.list()) {
                Some(phone) => intent = intent.with_resolved_phone(phone),
                None => {
                    let name = intent.recipient_token.clone();
                    self.fail(token, &Error::ResolutionAmbiguous(name)).await;
                    return;
                }
            }
        }

        let prompt = readback_prompt(&intent);
        if !self.advance(token, |session| {
            session.state = CommandState::AwaitingConfirmation;
            session.pending_intent = Some(intent.clone());
        }) {
            tracing::debug!("discarding intent for superseded session");
            return;
        }
        tracing::info!(recipient = %intent.recipient_token, "awaiting confirmation");

        // Readback failure is not fatal; the intent stays confirmable
        if let Err(e) = self.feedback.speak(&prompt, &self.lang).await {
            tracing::warn!(error = %e, "failed to speak confirmation prompt");
        }
    }

    /// Claim the session for a new pipeline run, returning its token
    fn begin_session(&self) -> Option<u64> {
        let mut session = self.session.lock().ok()?;
        if !matches!(session.state, CommandState::Idle | CommandState::Error) {
            tracing::debug!(state = ?session.state, "start ignored, session active");
            return None;
        }
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *session = CommandSession::listening(token);
        Some(token)
    }

    /// Emit the pending intent to the host and reset to idle
    ///
    /// No-op outside `AwaitingConfirmation`.
    pub async fn confirm(&self) {
        let claimed = {
            let Ok(mut session) = self.session.lock() else {
                return;
            };
            if session.state != CommandState::AwaitingConfirmation {
                tracing::debug!(state = ?session.state, "confirm ignored");
                return;
            }
            session.pending_intent.take().map(|intent| {
                session.state = CommandState::Confirmed;
                (session.token, intent)
            })
        };
        let Some((token, intent)) = claimed else {
            return;
        };

        tracing::info!(recipient = %intent.recipient_token, "command confirmed");
        self.host.on_submit(intent.clone());

        if let Err(e) = self.feedback.speak(&success_prompt(&intent), &self.lang).await {
            tracing::warn!(error = %e, "failed to speak success prompt");
        }

        self.reset_if_current(token);
    }

    /// Abort the session
    ///
    /// During `Listening`/`Parsing` the in-flight capture is cancelled and
    /// the session resets straight to idle; any result that still arrives for
    /// the superseded token is discarded. During `AwaitingConfirmation` the
    /// pending intent is dropped without emission. Elsewhere a no-op.
    pub async fn cancel(&self) {
        let prior = {
            let Ok(mut session) = self.session.lock() else {
                return;
            };
            match session.state {
                CommandState::Listening | CommandState::Parsing => {
                    // Supersede the pipeline before touching the platform
                    self.generation.fetch_add(1, Ordering::SeqCst);
                    let state = session.state;
                    *session = CommandSession::idle();
                    Some(state)
                }
                CommandState::AwaitingConfirmation => {
                    session.state = CommandState::Cancelled;
                    session.pending_intent = None;
                    Some(CommandState::AwaitingConfirmation)
                }
                _ => None,
            }
        };

        match prior {
            Some(CommandState::Listening | CommandState::Parsing) => {
                self.capture.cancel();
                self.host.on_dismiss();
                tracing::info!("capture cancelled, session reset");
            }
            Some(_) => {
                tracing::info!("pending command cancelled");
                self.host.on_dismiss();
                if let Err(e) = self.feedback.speak("Cancelled.", &self.lang).await {
                    tracing::warn!(error = %e, "failed to speak cancellation");
                }
                if let Ok(mut session) = self.session.lock() {
                    if session.state == CommandState::Cancelled {
                        *session = CommandSession::idle();
                    }
                }
            }
            None => tracing::debug!("cancel ignored, no active session"),
        }
    }

    /// Apply a session mutation if `token` still owns the session
    fn advance(&self, token: u64, mutate: impl FnOnce(&mut CommandSession)) -> bool {
        let Ok(mut session) = self.session.lock() else {
            return false;
        };
        if session.token != token {
            return false;
        }
        mutate(&mut session);
        true
    }

    /// Move the session to the error state and speak the message
    async fn fail(&self, token: u64, error: &Error) {
        let message = error.to_string();
        if !self.advance(token, |session| {
            session.state = CommandState::Error;
            session.pending_intent = None;
            session.error_message = Some(message.clone());
        }) {
            tracing::debug!("discarding error for superseded session");
            return;
        }

        tracing::warn!(%message, "voice command failed");
        if let Err(e) = self.feedback.speak(&message, &self.lang).await {
            tracing::warn!(error = %e, "failed to speak error message");
        }
    }

    fn reset_if_current(&self, token: u64) {
        if let Ok(mut session) = self.session.lock() {
            if session.token == token {
                *session = CommandSession::idle();
            }
        }
    }
}

/// Confirmation prompt read back to the user
fn readback_prompt(intent: &ParsedIntent) -> String {
    let amount = intent
        .amount
        .map(|a| a.to_string())
        .unwrap_or_default();

    match &intent.resolved_phone {
        Some(phone) if *phone == intent.recipient_token => {
            format!("Sending {amount} to {phone}. Confirm or cancel?")
        }
        Some(phone) => format!(
            "Sending {amount} to {}, {phone}. Confirm or cancel?",
            intent.recipient_token
        ),
        None => format!("Sending {amount} to {}. Confirm or cancel?", intent.recipient_token),
    }
}

/// Prompt spoken after a confirmed submission
fn success_prompt(intent: &ParsedIntent) -> String {
    let amount = intent
        .amount
        .map(|a| a.to_string())
        .unwrap_or_default();
    format!("Okay. Sending {amount} to {}.", intent.recipient_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readback_for_phone_recipient() {
        let intent = IntentParser::default().parse("send 500 shillings to 0712345678");
        assert_eq!(
            readback_prompt(&intent),
            "Sending 500 to 0712345678. Confirm or cancel?"
        );
    }

    #[test]
    fn test_readback_for_named_recipient() {
        let intent = IntentParser::default()
            .parse("send 200 to David")
            .with_resolved_phone("0722111222".to_string());
        assert_eq!(
            readback_prompt(&intent),
            "Sending 200 to David, 0722111222. Confirm or cancel?"
        );
    }

    #[test]
    fn test_success_prompt_names_the_recipient() {
        let intent = IntentParser::default()
            .parse("send 200 to David")
            .with_resolved_phone("0722111222".to_string());
        assert_eq!(success_prompt(&intent), "Okay. Sending 200 to David.");
    }
}
