//! Sauti - voice command gateway for mobile money transfers
//!
//! This library turns one spoken utterance into a confirmed transfer intent:
//! - Speech capture and synthesis behind swappable platform adapters
//! - Tolerant-but-safe parsing of "<verb> <amount> to <recipient>" commands
//! - Recipient resolution against an encrypted on-device contact vault
//! - A confirm/cancel state machine with spoken feedback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Hosting UI                        │
//! │        start() │ confirm() │ cancel()                │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │             VoiceCommandController                   │
//! │   Capture  │  Parser  │  Resolver  │  Feedback      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │          Host submit callback (transfer)             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The actual money movement (USSD dial or backend call) is the host's job;
//! the pipeline ends at the submit callback.

pub mod config;
pub mod contacts;
pub mod controller;
pub mod error;
pub mod intent;
pub mod speech;

pub use config::{Config, SpeechConfig};
pub use contacts::{
    ContactPicker, ContactVault, DirectoryEntry, EncryptedFileVault, MemoryVault, VoiceContact,
    VoiceContactStore, is_phone_shaped,
};
pub use controller::{CommandHost, CommandSession, CommandState, VoiceCommandController};
pub use error::{Error, Result};
pub use intent::{Confidence, IntentAction, IntentGrammar, IntentParser, ParsedIntent};
pub use speech::{
    CaptureError, ConsoleCapture, ConsolePlayback, SpeakOutcome, SpeechCapture, SpeechFeedback,
    SynthesisBackend, Utterance, VoiceInfo, VoicePreferences, select_voice,
};
