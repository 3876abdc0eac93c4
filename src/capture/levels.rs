//! Audio level meter for live waveform visualization.
//!
//! Reduces a raw audio frame to a fixed number of bucketed average
//! amplitudes. Pure and O(frame length) so it can run on the capture path
//! without backing up the audio pipeline.

/// Number of visualization bars published by a session.
pub const LEVEL_BARS: usize = 20;

/// Fixed gain applied before clamping to [0, 1].
const LEVEL_GAIN: f32 = 10.0;

/// Reduce a frame of samples to `bars` normalized loudness values.
///
/// Each bucket is the mean absolute amplitude of its slice of the frame,
/// scaled by a fixed gain and clamped to [0, 1]. An empty frame (or more
/// bars than samples) yields all-zero bars rather than an error.
pub fn bucket_levels(frame: &[f32], bars: usize) -> Vec<f32> {
    if bars == 0 {
        return Vec::new();
    }

    let samples_per_bar = frame.len() / bars;
    if samples_per_bar == 0 {
        return vec![0.0; bars];
    }

    let mut levels = Vec::with_capacity(bars);
    for i in 0..bars {
        let start = i * samples_per_bar;
        let end = (start + samples_per_bar).min(frame.len());

        let sum: f32 = frame[start..end].iter().map(|s| s.abs()).sum();
        let average = sum / (end - start) as f32;
        levels.push((average * LEVEL_GAIN).clamp(0.0, 1.0));
    }

    levels
}

/// All-zero bars, used to reset the meter when recording stops.
pub fn silent_levels() -> Vec<f32> {
    vec![0.0; LEVEL_BARS]
}
