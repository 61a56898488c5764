//! Contracts a neural scorer must satisfy to drive the streaming engine.
//!
//! Two shapes exist in the wild:
//!
//! - frame scorers (Silero V4/V5, TEN): one fixed-size frame in, one
//!   probability out, recurrent state advanced per call;
//! - chunk scorers (FSMN): a batch of samples in, one probability per
//!   low-frame-rate output frame, with explicit padding flags on the first
//!   and last inference of a stream.
//!
//! Implementors may be stateful (LSTM h/c, FSMN caches, conv caches); all
//! mutation is expressed through `&mut self`. `reset` zero-initialises that
//! state for a fresh stream.

use crate::error::Result;

/// One-frame-at-a-time scorer with fixed geometry.
pub trait FrameScorer {
    /// Samples by which consecutive frames advance.
    fn frame_shift(&self) -> usize;

    /// Samples handed to `score` per call. Overlap between consecutive
    /// frames is `frame_length() - frame_shift()`.
    fn frame_length(&self) -> usize;

    /// Zero-initialise all recurrent state.
    fn reset(&mut self);

    /// Score one frame of `frame_length()` samples, returning the
    /// probability of speech in [0, 1] and advancing recurrent state.
    ///
    /// # Errors
    /// Failures from the underlying inference engine are fatal; the
    /// caller must reset or discard the stream.
    fn score(&mut self, frame: &[f32]) -> Result<f32>;
}

/// Batched low-frame-rate scorer.
pub trait ChunkScorer {
    /// Samples per output frame (10 ms for FSMN).
    fn frame_shift(&self) -> usize;

    /// Samples covered by one output frame (25 ms for FSMN).
    fn frame_length(&self) -> usize;

    /// Zero-initialise all cache state and forget stream position.
    fn reset(&mut self);

    /// Score a batch of samples, returning one speech probability per
    /// output frame. `first_padding`/`last_padding` are the frame counts
    /// the model synthesises at the stream edges (2 on the first and last
    /// inference of a stream, 0 otherwise).
    fn score_chunk(
        &mut self,
        samples: &[f32],
        first_padding: i64,
        last_padding: i64,
    ) -> Result<Vec<f32>>;
}
