//! Voice command state machine integration tests
//!
//! Exercises the full capture-parse-resolve-confirm pipeline over scripted
//! adapters, including the cancellation races.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use sauti::{
    CaptureError, CommandState, IntentAction, MemoryVault, VoiceContact, VoiceContactStore,
};

mod common;
use common::{BrokenVault, ScriptedCapture, harness, harness_with_store};

fn david() -> Vec<VoiceContact> {
    vec![VoiceContact::new("David", "0722111222")]
}

#[tokio::test]
async fn test_phone_recipient_pipeline_end_to_end() {
    let capture = Arc::new(ScriptedCapture::with_transcript(
        "send 500 shillings to 0712345678",
    ));
    let h = harness(capture, &[]).await;

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::AwaitingConfirmation);
    let intent = h.controller.pending_intent().expect("pending intent");
    assert_eq!(intent.action, IntentAction::Send);
    assert_eq!(intent.resolved_phone.as_deref(), Some("0712345678"));

    // Readback was spoken
    let spoken = h.backend.spoken_texts();
    assert!(spoken.iter().any(|s| s.contains("0712345678")));

    h.controller.confirm().await;

    let submissions = h.host.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].resolved_phone.as_deref(), Some("0712345678"));

    // Success prompt spoken, session back to idle
    assert_eq!(h.controller.state(), CommandState::Idle);
    assert!(h.controller.pending_intent().is_none());
    assert!(h.backend.spoken_texts().len() >= 2);
}

#[tokio::test]
async fn test_named_recipient_resolves_from_store() {
    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to david"));
    let h = harness(capture, &david()).await;

    h.controller.start().await;

    let intent = h.controller.pending_intent().expect("pending intent");
    assert_eq!(intent.recipient_token, "david");
    assert_eq!(intent.resolved_phone.as_deref(), Some("0722111222"));
}

#[tokio::test]
async fn test_deleted_contact_leaves_intent_unresolved() {
    let vault = Arc::new(MemoryVault::new());
    let store = Arc::new(VoiceContactStore::new(vault));
    store.initialize().await.unwrap();
    store.save(VoiceContact::new("David", "0722111222")).await.unwrap();
    store.delete("David").await.unwrap();

    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to David"));
    let h = harness_with_store(capture, store);

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::Error);
    let message = h.controller.error_message().expect("error message");
    assert!(message.contains("David"));
    assert!(h.host.submissions().is_empty());
}

#[tokio::test]
async fn test_cancel_during_listening_discards_late_transcript() {
    let release = Arc::new(Notify::new());
    let capture = Arc::new(
        ScriptedCapture::with_transcript("send 500 to 0712345678").gated(release.clone()),
    );
    let h = harness(capture.clone(), &[]).await;

    let controller = h.controller.clone();
    let pipeline = tokio::spawn(async move { controller.start().await });

    // Let the pipeline reach the capture await
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.controller.state(), CommandState::Listening);

    h.controller.cancel().await;
    assert_eq!(h.controller.state(), CommandState::Idle);
    assert_eq!(capture.cancel_count(), 1);
    assert_eq!(h.host.dismissals(), 1);

    // The platform still delivers the transcript afterwards; it must be
    // discarded, not resurrect the session
    release.notify_one();
    pipeline.await.unwrap();

    assert_eq!(h.controller.state(), CommandState::Idle);
    assert!(h.controller.pending_intent().is_none());
    assert!(h.host.submissions().is_empty());
}

#[tokio::test]
async fn test_cancel_during_awaiting_confirmation_never_submits() {
    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to david"));
    let h = harness(capture, &david()).await;

    h.controller.start().await;
    assert_eq!(h.controller.state(), CommandState::AwaitingConfirmation);

    h.controller.cancel().await;

    assert_eq!(h.controller.state(), CommandState::Idle);
    assert!(h.host.submissions().is_empty());
    assert_eq!(h.host.dismissals(), 1);
}

#[tokio::test]
async fn test_confirm_outside_awaiting_confirmation_is_a_noop() {
    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to david"));
    let h = harness(capture, &david()).await;

    // Idle: nothing to confirm
    h.controller.confirm().await;
    assert_eq!(h.controller.state(), CommandState::Idle);
    assert!(h.host.submissions().is_empty());

    // Cancel outside a session is equally inert
    h.controller.cancel().await;
    assert_eq!(h.controller.state(), CommandState::Idle);
    assert_eq!(h.host.dismissals(), 0);
}

#[tokio::test]
async fn test_second_start_is_ignored_while_listening() {
    let release = Arc::new(Notify::new());
    let capture = Arc::new(
        ScriptedCapture::with_transcript("send 500 to 0712345678").gated(release.clone()),
    );
    let h = harness(capture, &[]).await;

    let controller = h.controller.clone();
    let pipeline = tokio::spawn(async move { controller.start().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Second start while a capture is in flight: rejected, state unchanged
    h.controller.start().await;
    assert_eq!(h.controller.state(), CommandState::Listening);

    release.notify_one();
    pipeline.await.unwrap();
    assert_eq!(h.controller.state(), CommandState::AwaitingConfirmation);
}

#[tokio::test]
async fn test_no_speech_error_is_recoverable_by_fresh_start() {
    let capture = Arc::new(ScriptedCapture::with_outcomes(vec![
        Err(CaptureError::NoSpeech),
        Ok("send 500 to 0712345678".to_string()),
    ]));
    let h = harness(capture, &[]).await;

    h.controller.start().await;
    assert_eq!(h.controller.state(), CommandState::Error);
    let message = h.controller.error_message().expect("error message");
    assert!(message.contains("no speech"));
    // Error message is spoken back
    assert!(h.backend.spoken_texts().iter().any(|s| s.contains("no speech")));

    // A fresh start recovers
    h.controller.start().await;
    assert_eq!(h.controller.state(), CommandState::AwaitingConfirmation);
}

#[tokio::test]
async fn test_permission_denied_surfaces_user_message() {
    let capture = Arc::new(ScriptedCapture::with_outcomes(vec![Err(
        CaptureError::PermissionDenied,
    )]));
    let h = harness(capture, &[]).await;

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::Error);
    let message = h.controller.error_message().expect("error message");
    assert!(message.contains("denied"));
}

#[tokio::test]
async fn test_unsupported_capture_fails_before_listening() {
    let capture = Arc::new(ScriptedCapture::unsupported());
    let h = harness(capture, &[]).await;

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::Error);
    let message = h.controller.error_message().expect("error message");
    assert!(message.contains("not supported"));
}

#[tokio::test]
async fn test_unparseable_transcript_is_nonfatal() {
    let capture = Arc::new(ScriptedCapture::with_transcript("what a lovely day"));
    let h = harness(capture, &[]).await;

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::Error);
    assert!(h.controller.error_message().is_some());
    assert!(h.host.submissions().is_empty());
}

#[tokio::test]
async fn test_storage_failure_during_resolution_surfaces() {
    let store = Arc::new(VoiceContactStore::new(Arc::new(BrokenVault)));
    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to David"));
    let h = harness_with_store(capture, store);

    h.controller.start().await;

    assert_eq!(h.controller.state(), CommandState::Error);
    let message = h.controller.error_message().expect("error message");
    assert!(message.contains("storage"));
}

#[tokio::test]
async fn test_transcript_is_exposed_to_the_ui() {
    let capture = Arc::new(ScriptedCapture::with_transcript("send 200 to david"));
    let h = harness(capture, &david()).await;

    h.controller.start().await;

    let session = h.controller.session();
    assert_eq!(session.transcript.as_deref(), Some("send 200 to david"));
    assert!(session.pending_intent.is_some());
}
