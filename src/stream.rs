//! Frame dispatchers: dice arbitrarily sized audio chunks into scorer
//! frames and drive the segment state machine.
//!
//! Two dispatchers cover the backend families:
//!
//! - [`FrameStream`]: the general loop. Accumulates samples, scores
//!   `frame_length`-sized windows, and advances the read pointer by
//!   `frame_shift` (not `frame_length`), so backends whose frames overlap
//!   (Silero V5, TEN) see the shared tail again on the next frame without
//!   any separate history buffer.
//! - [`LfrStream`]: FSMN's low-frame-rate streaming. Batches samples,
//!   runs the model with explicit first/last padding flags, and keeps a
//!   55 ms look-behind context in the buffer between inferences.
//!
//! Both present the same surface: `decode(samples, is_last)` returning the
//! segments finished during the call, plus `flush` and `reset`. An open
//! segment is never returned by `decode`; it surfaces only once closed by
//! detected silence, the max-duration split, or `flush`.

use crate::config::VadConfig;
use crate::error::Result;
use crate::scorer::{ChunkScorer, FrameScorer};
use crate::segment::VadSegment;
use crate::segmenter::Segmenter;

/// Streaming dispatcher for per-frame scorers.
pub struct FrameStream<S> {
    scorer: S,
    segmenter: Segmenter,
    /// Carry-over samples not yet consumed by a full frame. Shorter than
    /// `frame_length` between calls; grows transiently during one.
    reminder: Vec<f32>,
}

impl<S: FrameScorer> FrameStream<S> {
    pub fn new(scorer: S, config: &VadConfig) -> Self {
        let segmenter = Segmenter::new(config, scorer.frame_shift());
        Self {
            scorer,
            segmenter,
            reminder: Vec::new(),
        }
    }

    /// Feed PCM samples (f32 in [-1, 1] at the configured rate) and collect
    /// every segment that finished during this call.
    pub fn decode(&mut self, samples: &[f32], is_last: bool) -> Result<Vec<VadSegment>> {
        if samples.is_empty() && !is_last {
            return Ok(Vec::new());
        }

        self.reminder.extend_from_slice(samples);

        let frame_length = self.scorer.frame_length();
        let frame_shift = self.scorer.frame_shift();
        let mut offset = 0;
        while self.reminder.len() >= offset + frame_length {
            let prob = self.scorer.score(&self.reminder[offset..offset + frame_length])?;
            self.segmenter.push_prob(prob);
            offset += frame_shift;
        }

        if is_last {
            self.segmenter.finish();
            self.reminder.clear();
        } else {
            self.reminder.drain(..offset);
        }

        Ok(self.segmenter.take_segments())
    }

    /// Terminate the stream, closing and returning any open segment.
    pub fn flush(&mut self) -> Option<VadSegment> {
        self.reminder.clear();
        self.segmenter.flush()
    }

    /// Return to a fresh stream: recurrent state zeroed, positions cleared.
    pub fn reset(&mut self) {
        self.scorer.reset();
        self.segmenter.reset();
        self.reminder.clear();
    }

    pub fn frame_shift(&self) -> usize {
        self.scorer.frame_shift()
    }

    pub fn frame_length(&self) -> usize {
        self.scorer.frame_length()
    }
}

/// Streaming dispatcher for FSMN-style batched low-frame-rate scorers.
///
/// The model's LFR layer concatenates 5 frames and shrinks the output by 4,
/// so the dispatcher keeps a 4-frame (55 ms) tail in the buffer as context
/// for the next inference. The first inference waits for 100 ms of audio
/// and runs with `first_padding = 2`; the final one runs the residual with
/// `last_padding = 2`.
pub struct LfrStream<S> {
    scorer: S,
    segmenter: Segmenter,
    reminder: Vec<f32>,
    first_inference: bool,
}

impl<S: ChunkScorer> LfrStream<S> {
    pub fn new(scorer: S, config: &VadConfig) -> Self {
        let segmenter = Segmenter::new(config, scorer.frame_shift());
        Self {
            scorer,
            segmenter,
            reminder: Vec::new(),
            first_inference: true,
        }
    }

    /// Feed PCM samples and collect every segment finished during the call.
    pub fn decode(&mut self, samples: &[f32], is_last: bool) -> Result<Vec<VadSegment>> {
        self.reminder.extend_from_slice(samples);
        if self.reminder.is_empty() && !is_last {
            return Ok(Vec::new());
        }

        let shift = self.scorer.frame_shift();
        // 4 frames of context: (4 - 1) * shift + length samples (55 ms).
        let context_limit = 3 * shift + self.scorer.frame_length();
        // 100 ms gate before the first inference.
        let first_chunk_limit = 10 * shift;

        if self.first_inference {
            if self.reminder.len() < first_chunk_limit && !is_last {
                return Ok(Vec::new());
            }
            let last_padding = if is_last { 2 } else { 0 };
            let probs = self.scorer.score_chunk(&self.reminder, 2, last_padding)?;
            self.first_inference = false;

            if is_last {
                self.push_probs(&probs, probs.len());
                self.segmenter.finish();
                self.reminder.clear();
            } else {
                // The padded first pass yields (real frames - 2) outputs;
                // consuming two fewer leaves exactly the 4-frame context.
                let consume = probs.len().saturating_sub(2);
                self.push_probs(&probs, consume);
                self.erase_consumed(consume * shift);
            }
        } else if !is_last {
            if self.reminder.len() > context_limit {
                let probs = self.scorer.score_chunk(&self.reminder, 0, 0)?;
                self.push_probs(&probs, probs.len());
                self.erase_consumed(probs.len() * shift);
            }
        } else {
            if !self.reminder.is_empty() {
                let probs = self.scorer.score_chunk(&self.reminder, 0, 2)?;
                self.push_probs(&probs, probs.len());
            }
            self.segmenter.finish();
            self.reminder.clear();
        }

        Ok(self.segmenter.take_segments())
    }

    /// Terminate the stream, closing and returning any open segment.
    pub fn flush(&mut self) -> Option<VadSegment> {
        self.reminder.clear();
        self.segmenter.flush()
    }

    /// Return to a fresh stream.
    pub fn reset(&mut self) {
        self.scorer.reset();
        self.segmenter.reset();
        self.reminder.clear();
        self.first_inference = true;
    }

    pub fn frame_shift(&self) -> usize {
        self.scorer.frame_shift()
    }

    pub fn frame_length(&self) -> usize {
        self.scorer.frame_length()
    }

    fn push_probs(&mut self, probs: &[f32], limit: usize) {
        for &p in &probs[..limit.min(probs.len())] {
            self.segmenter.push_prob(p);
        }
    }

    fn erase_consumed(&mut self, samples: usize) {
        self.reminder.drain(..samples.min(self.reminder.len()));
    }
}
