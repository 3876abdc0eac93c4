//! Batch transcription of recorded audio files.
//!
//! Shells out to a local whisper binary; used by `ask --audio` when the
//! question was captured outside a live session. The recognized language is
//! reported so the caller can cross-check it against the destination.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::process::Command;

/// Result of transcribing an audio file
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub text: String,
    pub language: String,
    pub duration_seconds: f64,
}

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    end: f64,
}

impl WhisperOutput {
    fn into_result(self) -> TranscriptResult {
        let duration = self.segments.last().map(|s| s.end).unwrap_or(0.0);
        TranscriptResult {
            text: self.text.trim().to_string(),
            language: if self.language.is_empty() {
                "en".to_string()
            } else {
                self.language
            },
            duration_seconds: duration,
        }
    }
}

/// Transcribe an audio file with a local whisper binary.
///
/// `language` forces the recognition language; `None` lets whisper detect
/// it. The binary path comes from `WHISPER_PATH`, defaulting to the
/// Homebrew install location.
pub async fn transcribe_file(
    audio_path: &Path,
    model: &str,
    language: Option<&str>,
) -> Result<TranscriptResult> {
    let whisper_path =
        std::env::var("WHISPER_PATH").unwrap_or_else(|_| "/opt/homebrew/bin/whisper".to_string());

    // Temp dir for whisper's output files
    let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;

    let mut command = Command::new(&whisper_path);
    command
        .arg(audio_path)
        .arg("--model")
        .arg(model)
        .arg("--output_dir")
        .arg(temp_dir.path())
        .arg("--output_format")
        .arg("json");
    if let Some(language) = language {
        command.arg("--language").arg(language);
    }

    let output = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to run whisper for {}", audio_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Whisper failed: {}", stderr.trim());
    }

    let stem = audio_path.file_stem().unwrap_or_default().to_string_lossy();
    let json_path = temp_dir.path().join(format!("{}.json", stem));

    let json_content = tokio::fs::read_to_string(&json_path)
        .await
        .context("Failed to read whisper output")?;

    let whisper: WhisperOutput =
        serde_json::from_str(&json_content).context("Failed to parse whisper JSON")?;

    Ok(whisper.into_result())
}
