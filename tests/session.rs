//! Recording state machine integration tests: the full capture flow from
//! start through stop to generation, plus error recovery paths.

use std::sync::Arc;
use std::time::Duration;

use lancards::capture::{
    silent_levels, CaptureError, Permissions, RecognizerError, RecognizerEvent,
    ScriptedRecognizer, SilentSource, TranscriptionSession, TranscriptionState,
};
use lancards::generate::CardGenerator;

fn session(
    permissions: Permissions,
    recognizer: ScriptedRecognizer,
) -> (
    TranscriptionSession,
    tokio::sync::broadcast::Sender<RecognizerEvent>,
) {
    let injector = recognizer.injector();
    let session = TranscriptionSession::new(
        permissions,
        Arc::new(SilentSource::new().with_amplitude(0.05)),
        Arc::new(recognizer),
    )
    .with_teardown_timeout(Duration::from_millis(300));
    (session, injector)
}

#[tokio::test]
async fn voice_to_card_flow() {
    let (session, injector) = session(
        Permissions::granted(),
        ScriptedRecognizer::new(Some("how do I greet business partners in Japan")),
    );

    // Record
    session.start().await.unwrap();
    assert_eq!(*session.state().borrow(), TranscriptionState::Recording);
    injector
        .send(RecognizerEvent::Partial("how do I greet".to_string()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*session.transcript().borrow(), "how do I greet");

    // Stop yields the final transcript and freezes the pipeline
    let question = session.stop().await.unwrap();
    assert_eq!(question, "how do I greet business partners in Japan");
    assert_eq!(*session.state().borrow(), TranscriptionState::Processing);
    assert_eq!(*session.levels().borrow(), silent_levels());

    // Hand the transcript to generation
    let generator = CardGenerator::offline();
    let card = generator.generate("Japan", &question).await.unwrap();
    assert!(card.is_ai_generated);
    assert_eq!(card.question.as_deref(), Some(question.as_str()));

    session.mark_generated();
    assert_eq!(*session.state().borrow(), TranscriptionState::Generated);

    // And back to Ready for the next question
    session.reset();
    assert_eq!(*session.state().borrow(), TranscriptionState::Ready);
}

#[tokio::test]
async fn permission_denied_blocks_recording() {
    let (session, _inj) = session(Permissions::denied(), ScriptedRecognizer::new(None));

    let err = session.start().await.unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied));
    assert!(!err.is_recoverable());
    assert_eq!(*session.state().borrow(), TranscriptionState::Ready);
}

#[tokio::test]
async fn start_while_recording_is_a_no_op() {
    let (session, _inj) = session(
        Permissions::granted(),
        ScriptedRecognizer::new(Some("done")),
    );

    session.start().await.unwrap();
    let state_before = *session.state().borrow();
    session.start().await.unwrap();
    assert_eq!(*session.state().borrow(), state_before);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn stop_immediately_after_start_does_not_hang() {
    let (session, _inj) = session(
        Permissions::granted(),
        ScriptedRecognizer::new(Some("quick")),
    );

    session.start().await.unwrap();
    let transcript = session.stop().await.unwrap();
    assert_eq!(transcript, "quick");
    assert_eq!(*session.levels().borrow(), silent_levels());
}

#[tokio::test]
async fn cancellation_after_stop_is_swallowed() {
    let (session, injector) = session(
        Permissions::granted(),
        ScriptedRecognizer::new(Some("final words")),
    );

    session.start().await.unwrap();
    session.stop().await.unwrap();

    // A late cancellation must not resurrect an error
    let _ = injector.send(RecognizerEvent::Error(RecognizerError::Canceled));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*session.state().borrow(), TranscriptionState::Processing);
    assert!(session.error_message().borrow().is_none());
}

#[tokio::test]
async fn cancellation_mid_recording_recovers_via_restart() {
    let (session, injector) = session(Permissions::granted(), ScriptedRecognizer::new(None));

    session.start().await.unwrap();
    injector
        .send(RecognizerEvent::Error(RecognizerError::Canceled))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*session.state().borrow(), TranscriptionState::Error);
    let message = session.error_message().borrow().clone().unwrap();
    assert!(message.contains("try again"));

    // The session stays usable
    session.start().await.unwrap();
    assert_eq!(*session.state().borrow(), TranscriptionState::Recording);
    assert!(session.error_message().borrow().is_none());
    session.stop().await.unwrap();
}

#[tokio::test]
async fn transient_unavailability_is_recoverable() {
    let (session, injector) = session(Permissions::granted(), ScriptedRecognizer::new(None));

    session.start().await.unwrap();
    injector
        .send(RecognizerEvent::Error(
            RecognizerError::TemporarilyUnavailable,
        ))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*session.state().borrow(), TranscriptionState::Error);
    assert!(CaptureError::RecognizerUnavailable.is_recoverable());

    session.start().await.unwrap();
    session.stop().await.unwrap();
}
