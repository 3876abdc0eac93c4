//! Speech recognition and microphone seams.
//!
//! The live session talks to the platform through two narrow traits:
//! `AudioSource` (the microphone) and `SpeechRecognizer` (the speech-to-text
//! backend). Any backend implementing these can be substituted; a
//! channel-driven `ScriptedRecognizer` and `SilentSource` ship for tests and
//! offline use.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use super::CaptureError;

/// One frame of mono float samples from the capture device.
pub type AudioFrame = Vec<f32>;

/// Errors surfaced by a speech-recognition backend.
///
/// `Canceled` is not uniformly fatal: the session swallows it when the
/// caller requested stop, and treats it as an unexpected interruption
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizerError {
    #[error("recognition was canceled")]
    Canceled,

    #[error("speech recognition temporarily unavailable")]
    TemporarilyUnavailable,

    #[error("recognition engine failed to start: {0}")]
    EngineStart(String),

    #[error("recognizer backend error: {0}")]
    Backend(String),
}

/// Asynchronous result delivered by a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// Live partial transcript (replaces previous partials)
    Partial(String),

    /// Final transcript for the utterance
    Final(String),

    /// Terminal backend error; may arrive after the caller stopped
    Error(RecognizerError),
}

/// An in-flight recognition stream: feed frames in, read events out.
///
/// Dropping the frame sender signals end-of-audio and asks the backend to
/// finalize.
pub struct RecognizerStream {
    /// Audio input to the recognizer
    pub frames: mpsc::Sender<AudioFrame>,

    /// Partial/final/error events from the recognizer
    pub events: mpsc::Receiver<RecognizerEvent>,
}

/// A speech-to-text backend.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Begin a recognition stream.
    async fn start(&self) -> Result<RecognizerStream, RecognizerError>;
}

/// A source of raw audio frames (the microphone).
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Open the device and stream frames until the receiver is dropped.
    async fn open(&self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;
}

/// Channel capacity for frames and events.
const CHANNEL_CAPACITY: usize = 64;

/// A recognizer driven by test/offline scripts.
///
/// Frames fed to it are counted and discarded. Events are injected through
/// [`ScriptedRecognizer::injector`]; when the frame channel closes and an
/// `auto_final` text is configured, a `Final` event is emitted so that
/// session teardown sees a finalized transcript.
pub struct ScriptedRecognizer {
    auto_final: Option<String>,
    inject_tx: broadcast::Sender<RecognizerEvent>,
    frames_seen: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn new(auto_final: Option<&str>) -> Self {
        let (inject_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            auto_final: auto_final.map(str::to_string),
            inject_tx,
            frames_seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle for pushing partial/final/error events into the stream.
    pub fn injector(&self) -> broadcast::Sender<RecognizerEvent> {
        self.inject_tx.clone()
    }

    /// Number of audio frames received so far, across all streams.
    pub fn frames_seen(&self) -> usize {
        self.frames_seen.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(&self) -> Result<RecognizerStream, RecognizerError> {
        let (frame_tx, mut frame_rx) = mpsc::channel::<AudioFrame>(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<RecognizerEvent>(CHANNEL_CAPACITY);

        let mut inject_rx = self.inject_tx.subscribe();
        let frames_seen = self.frames_seen.clone();
        let auto_final = self.auto_final.clone();

        tokio::spawn(async move {
            let mut inject_open = true;
            loop {
                tokio::select! {
                    frame = frame_rx.recv() => match frame {
                        Some(_) => {
                            frames_seen.fetch_add(1, Ordering::Relaxed);
                        }
                        None => {
                            if let Some(text) = auto_final {
                                let _ = event_tx.send(RecognizerEvent::Final(text)).await;
                            }
                            break;
                        }
                    },
                    injected = inject_rx.recv(), if inject_open => match injected {
                        Ok(event) => {
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => inject_open = false,
                    },
                }
            }
        });

        Ok(RecognizerStream {
            frames: frame_tx,
            events: event_rx,
        })
    }
}

/// A microphone stand-in that emits constant-amplitude frames at a fixed
/// cadence until the session drops the receiver.
pub struct SilentSource {
    amplitude: f32,
    frame_len: usize,
    interval: std::time::Duration,
}

impl SilentSource {
    pub fn new() -> Self {
        Self {
            amplitude: 0.0,
            frame_len: 1024,
            interval: std::time::Duration::from_millis(20),
        }
    }

    /// Emit frames of the given amplitude instead of silence.
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }
}

impl Default for SilentSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSource for SilentSource {
    async fn open(&self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        let (tx, rx) = mpsc::channel::<AudioFrame>(CHANNEL_CAPACITY);
        let frame = vec![self.amplitude; self.frame_len];
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                if tx.send(frame.clone()).await.is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        Ok(rx)
    }
}
