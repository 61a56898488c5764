//! Streaming VAD configuration.
//!
//! All millisecond quantities are converted once, at instance construction,
//! into frame counts (rounding up against the active backend's frame shift)
//! and sample counts. The defaults below are tuned for 16 kHz call-centre
//! audio and deliberately asymmetric: entering speech is easier than
//! leaving it, trading a little false speech for fewer clipped syllables.

use serde::{Deserialize, Serialize};

/// Immutable per-instance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Speech probability above which a frame counts as speech. Default: 0.4.
    pub threshold: f32,
    /// PCM sample rate in Hz; must match what the scorer was built for.
    /// Default: 16000.
    pub sample_rate: u32,
    /// Smoothing window used to detect the silence→speech transition (ms).
    /// Default: 300.
    pub speech_window_size_ms: u32,
    /// Speech frames required inside that window (ms worth). Default: 250.
    pub speech_window_threshold_ms: u32,
    /// Smoothing window used to detect the speech→silence transition (ms).
    /// Default: 600.
    pub silence_window_size_ms: u32,
    /// Silence frames required inside that window (ms worth). Default: 500.
    pub silence_window_threshold_ms: u32,
    /// Hard cap on a single segment; longer speech is split. Default: 10000.
    pub max_speech_ms: u32,
    /// Prepended to a detected start. Default: 100.
    pub left_padding_ms: u32,
    /// Appended to a detected end. Default: 100.
    pub right_padding_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            sample_rate: 16_000,
            speech_window_size_ms: 300,
            speech_window_threshold_ms: 250,
            silence_window_size_ms: 600,
            silence_window_threshold_ms: 500,
            max_speech_ms: 10_000,
            left_padding_ms: 100,
            right_padding_ms: 100,
        }
    }
}

impl VadConfig {
    /// Samples per millisecond at the configured rate.
    pub fn samples_per_ms(&self) -> i32 {
        (self.sample_rate / 1000) as i32
    }
}
