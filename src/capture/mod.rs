//! Voice capture and live transcription.
//!
//! The capture pipeline:
//!
//! 1. **AudioSource**: streams raw frames from the microphone
//! 2. **TranscriptionSession**: recording state machine; forwards frames to
//!    the recognizer and derives level bars for visualization
//! 3. **SpeechRecognizer**: speech-to-text backend behind a trait seam
//! 4. **whisper**: batch transcription of already-recorded audio files
//!
//! # Architecture
//!
//! ```text
//! microphone → session ──frames──→ recognizer
//!                 │                    │
//!              levels[20]       partial/final text
//!                 └──── watch channels ────┘
//! ```

pub mod levels;
pub mod recognizer;
pub mod session;
pub mod whisper;

use thiserror::Error;

// Re-export key types
pub use levels::{bucket_levels, silent_levels, LEVEL_BARS};
pub use recognizer::{
    AudioFrame, AudioSource, RecognizerError, RecognizerEvent, RecognizerStream,
    ScriptedRecognizer, SilentSource, SpeechRecognizer,
};
pub use session::{Permissions, TranscriptionSession};
pub use whisper::{transcribe_file, TranscriptResult};

/// Pipeline-owned recording state. Drives which operations are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionState {
    /// Idle, ready to record
    Ready,

    /// Microphone open, frames streaming to the recognizer
    Recording,

    /// Stopped; final transcript handed to the orchestrator
    Processing,

    /// Downstream generation produced a card
    Generated,

    /// A recoverable capture error; `start()` is legal again
    Error,
}

/// Errors from the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("microphone or speech recognition permission denied")]
    PermissionDenied,

    #[error("audio engine failed to start: {0}")]
    EngineStart(String),

    /// Recognition was interrupted mid-recording. Recoverable; retry is
    /// caller-directed.
    #[error("speech recognition was interrupted, please try again")]
    Interrupted,

    /// Backend briefly unavailable. Recoverable; retry is caller-directed.
    #[error("speech recognition temporarily unavailable, please try again")]
    RecognizerUnavailable,

    #[error("speech recognition error: {0}")]
    Recognizer(String),
}

impl CaptureError {
    /// Whether the caller may simply retry `start()`.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Interrupted | Self::RecognizerUnavailable)
    }
}
