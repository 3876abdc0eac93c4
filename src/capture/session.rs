//! Live transcription session: microphone lifecycle, recognizer streaming,
//! level metering, and the recording state machine.
//!
//! Published state (transcript, level bars, state, last error) is delivered
//! through `watch` channels that callers subscribe to explicitly; there is
//! no shared singleton. Error classification is the core design decision:
//! a cancellation that arrives after the caller requested stop is benign
//! and swallowed, the same cancellation mid-recording is an unexpected
//! interruption that forces cleanup and surfaces a recoverable error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::levels::{bucket_levels, silent_levels, LEVEL_BARS};
use super::recognizer::{
    AudioFrame, AudioSource, RecognizerError, RecognizerEvent, RecognizerStream, SpeechRecognizer,
};
use super::{CaptureError, TranscriptionState};

/// Capture grants the session requires before recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub microphone: bool,
    pub speech_recognition: bool,
}

impl Permissions {
    /// Both grants present.
    pub fn granted() -> Self {
        Self {
            microphone: true,
            speech_recognition: true,
        }
    }

    /// Neither grant present.
    pub fn denied() -> Self {
        Self {
            microphone: false,
            speech_recognition: false,
        }
    }

    fn all_granted(&self) -> bool {
        self.microphone && self.speech_recognition
    }
}

/// How long `stop()` waits for the recognizer to finalize before giving up
/// and returning the latest partial transcript.
const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Handles owned by an in-flight recording.
struct ActiveRecording {
    stop_requested: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    final_rx: oneshot::Receiver<String>,
    task: JoinHandle<()>,
}

/// A live voice-capture and transcription session.
pub struct TranscriptionSession {
    permissions: Permissions,
    source: Arc<dyn AudioSource>,
    recognizer: Arc<dyn SpeechRecognizer>,
    teardown_timeout: Duration,

    state_tx: watch::Sender<TranscriptionState>,
    transcript_tx: watch::Sender<String>,
    levels_tx: watch::Sender<Vec<f32>>,
    error_tx: watch::Sender<Option<String>>,

    active: Mutex<Option<ActiveRecording>>,
}

impl TranscriptionSession {
    pub fn new(
        permissions: Permissions,
        source: Arc<dyn AudioSource>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        Self {
            permissions,
            source,
            recognizer,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            state_tx: watch::channel(TranscriptionState::Ready).0,
            transcript_tx: watch::channel(String::new()).0,
            levels_tx: watch::channel(silent_levels()).0,
            error_tx: watch::channel(None).0,
            active: Mutex::new(None),
        }
    }

    /// Override the teardown wait for final recognition results.
    pub fn with_teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Subscribe to state transitions.
    pub fn state(&self) -> watch::Receiver<TranscriptionState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to the live (partial, then final) transcript.
    pub fn transcript(&self) -> watch::Receiver<String> {
        self.transcript_tx.subscribe()
    }

    /// Subscribe to the visualization level bars.
    pub fn levels(&self) -> watch::Receiver<Vec<f32>> {
        self.levels_tx.subscribe()
    }

    /// Subscribe to the advisory last-error message.
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Begin recording.
    ///
    /// Fails with `PermissionDenied` unless both grants are present. A
    /// no-op (not an error) while already Recording. Legal from Ready,
    /// Processing, Generated, and Error.
    pub async fn start(&self) -> Result<(), CaptureError> {
        if !self.permissions.all_granted() {
            let err = CaptureError::PermissionDenied;
            self.error_tx.send_replace(Some(err.to_string()));
            return Err(err);
        }

        let mut active = self.active.lock().await;
        if *self.state_tx.borrow() == TranscriptionState::Recording {
            debug!("already recording, ignoring start request");
            return Ok(());
        }

        // Drop any stale task from a previous error
        if let Some(stale) = active.take() {
            stale.task.abort();
        }

        self.error_tx.send_replace(None);
        self.transcript_tx.send_replace(String::new());
        self.levels_tx.send_replace(silent_levels());

        let frames = self.source.open().await.map_err(|e| {
            self.error_tx.send_replace(Some(e.to_string()));
            e
        })?;
        let stream = self.recognizer.start().await.map_err(|e| {
            let err = match e {
                RecognizerError::TemporarilyUnavailable => CaptureError::RecognizerUnavailable,
                RecognizerError::EngineStart(msg) => CaptureError::EngineStart(msg),
                other => CaptureError::Recognizer(other.to_string()),
            };
            self.error_tx.send_replace(Some(err.to_string()));
            err
        })?;

        let stop_requested = Arc::new(AtomicBool::new(false));
        let stop_notify = Arc::new(Notify::new());
        let (final_tx, final_rx) = oneshot::channel();

        let task = tokio::spawn(run_capture(
            frames,
            stream,
            CaptureTask {
                stop_requested: stop_requested.clone(),
                stop_notify: stop_notify.clone(),
                final_tx: Some(final_tx),
                state_tx: self.state_tx.clone(),
                transcript_tx: self.transcript_tx.clone(),
                levels_tx: self.levels_tx.clone(),
                error_tx: self.error_tx.clone(),
            },
        ));

        *active = Some(ActiveRecording {
            stop_requested,
            stop_notify,
            final_rx,
            task,
        });

        self.state_tx.send_replace(TranscriptionState::Recording);
        info!(recognizer = self.recognizer.name(), "recording started");
        Ok(())
    }

    /// Stop recording and return the final transcript.
    ///
    /// Safe from any state; outside Recording it returns the current
    /// transcript without side effects. Teardown is bounded by the
    /// teardown timeout so a slow recognizer can never hang the caller.
    pub async fn stop(&self) -> Result<String, CaptureError> {
        let mut active = self.active.lock().await;
        if *self.state_tx.borrow() != TranscriptionState::Recording {
            return Ok(self.transcript_tx.borrow().clone());
        }

        let Some(recording) = active.take() else {
            return Ok(self.transcript_tx.borrow().clone());
        };

        recording.stop_requested.store(true, Ordering::SeqCst);
        recording.stop_notify.notify_one();

        let final_text = match timeout(self.teardown_timeout, recording.final_rx).await {
            Ok(Ok(text)) => text,
            // Recognizer slow or gone; use the latest partial
            _ => self.transcript_tx.borrow().clone(),
        };
        recording.task.abort();

        self.levels_tx.send_replace(silent_levels());
        self.state_tx.send_replace(TranscriptionState::Processing);
        info!(transcript_len = final_text.len(), "recording stopped");
        Ok(final_text)
    }

    /// Record that downstream generation produced a card.
    pub fn mark_generated(&self) {
        self.state_tx.send_replace(TranscriptionState::Generated);
    }

    /// Return to Ready for the next capture.
    pub fn reset(&self) {
        self.state_tx.send_replace(TranscriptionState::Ready);
        self.error_tx.send_replace(None);
    }
}

/// Channels handed to the spawned capture task.
struct CaptureTask {
    stop_requested: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
    final_tx: Option<oneshot::Sender<String>>,
    state_tx: watch::Sender<TranscriptionState>,
    transcript_tx: watch::Sender<String>,
    levels_tx: watch::Sender<Vec<f32>>,
    error_tx: watch::Sender<Option<String>>,
}

impl CaptureTask {
    /// Deliver the final transcript to a waiting `stop()`.
    fn finish(&mut self, text: String) {
        if let Some(tx) = self.final_tx.take() {
            let _ = tx.send(text);
        }
    }

    /// Force cleanup and publish an error, leaving the session in
    /// `next_state`.
    fn fail(&mut self, err: CaptureError, next_state: TranscriptionState) {
        self.levels_tx.send_replace(silent_levels());
        self.error_tx.send_replace(Some(err.to_string()));
        self.state_tx.send_replace(next_state);
    }
}

/// Capture loop: forwards frames to the recognizer, derives level bars,
/// republishes transcripts, and classifies recognizer errors.
async fn run_capture(
    mut frames: tokio::sync::mpsc::Receiver<AudioFrame>,
    stream: RecognizerStream,
    mut ctx: CaptureTask,
) {
    let RecognizerStream {
        frames: rec_frames,
        events: mut rec_events,
    } = stream;
    let mut rec_frames = Some(rec_frames);
    let mut source_open = true;
    let mut stopping = false;

    loop {
        tokio::select! {
            _ = ctx.stop_notify.notified(), if !stopping => {
                stopping = true;
                // Closing the frame channel asks the backend to finalize
                rec_frames = None;
                ctx.levels_tx.send_replace(silent_levels());
            }

            frame = frames.recv(), if source_open && !stopping => {
                match frame {
                    Some(frame) => {
                        // Forward to the recognizer without ever blocking on
                        // its latency; a full channel drops the frame.
                        if let Some(tx) = &rec_frames {
                            if tx.try_send(frame.clone()).is_err() {
                                debug!("recognizer backpressure, dropping frame");
                            }
                        }
                        // Level metering is independent of recognition
                        ctx.levels_tx.send_replace(bucket_levels(&frame, LEVEL_BARS));
                    }
                    None => source_open = false,
                }
            }

            event = rec_events.recv() => match event {
                Some(RecognizerEvent::Partial(text)) => {
                    ctx.transcript_tx.send_replace(text);
                }
                Some(RecognizerEvent::Final(text)) => {
                    ctx.transcript_tx.send_replace(text.clone());
                    if stopping || ctx.stop_requested.load(Ordering::SeqCst) {
                        ctx.finish(text);
                        return;
                    }
                    // A final without a stop request is tolerated; keep
                    // running until the caller stops.
                }
                Some(RecognizerEvent::Error(err)) => {
                    let stop_requested =
                        stopping || ctx.stop_requested.load(Ordering::SeqCst);
                    match err {
                        RecognizerError::Canceled if stop_requested => {
                            // Benign: we asked for the stop
                            debug!("recognizer canceled after stop request");
                            let text = ctx.transcript_tx.borrow().clone();
                            ctx.finish(text);
                            return;
                        }
                        RecognizerError::Canceled => {
                            warn!("unexpected cancellation during recording, forcing cleanup");
                            ctx.fail(CaptureError::Interrupted, TranscriptionState::Error);
                            return;
                        }
                        RecognizerError::TemporarilyUnavailable => {
                            warn!("recognizer temporarily unavailable");
                            ctx.fail(
                                CaptureError::RecognizerUnavailable,
                                TranscriptionState::Error,
                            );
                            return;
                        }
                        other => {
                            warn!(error = %other, "recognizer error");
                            ctx.fail(
                                CaptureError::Recognizer(other.to_string()),
                                TranscriptionState::Ready,
                            );
                            return;
                        }
                    }
                }
                None => {
                    // Recognizer ended; deliver whatever we have
                    let text = ctx.transcript_tx.borrow().clone();
                    ctx.finish(text);
                    return;
                }
            },
        }
    }
}
