//! Silence ↔ speech segment state machine.
//!
//! Consumes one speech probability per frame and produces validated, padded,
//! length-bounded segments:
//!
//! ```text
//! prob ─► threshold ─► SlidingWindowBit ─► check_speech / check_silence
//!                                              │
//!                               on_voice_start / on_voice_end
//!                                              │
//!                                  finished VadSegments (drained per call)
//! ```
//!
//! The smoothing windows introduce latency: by the time a transition fires,
//! several frames of the opposite class have already been pushed. The run
//! length at the newest end of the window (`num_right_ones` /
//! `num_right_zeros`) measures how far back the transition actually began,
//! and the boundary is placed there, expanded by the configured padding and
//! clamped so segments never overlap or end in the future.

use crate::config::VadConfig;
use crate::segment::VadSegment;
use crate::window::SlidingWindowBit;

/// Per-frame segment tracker for one stream.
///
/// All millisecond configuration is converted here, once, into frame and
/// sample counts against the scorer's frame shift.
#[derive(Debug)]
pub struct Segmenter {
    threshold: f32,
    frame_shift: i32,
    samples_per_ms: i32,
    speech_window_frames: usize,
    speech_threshold_frames: usize,
    silence_window_frames: usize,
    silence_threshold_frames: usize,
    left_padding_samples: i32,
    right_padding_samples: i32,
    max_speech_samples: i32,
    window: SlidingWindowBit,

    /// Absolute sample position just past the newest scored frame.
    current: i32,
    /// Where the previously closed segment ended; next start clamps here.
    last_end: i32,
    /// Start of the open segment, or -1 when idle.
    start: i32,
    /// Next segment index to assign.
    seg_idx: i32,
    /// Segments finished since the last drain.
    finished: Vec<VadSegment>,
}

fn ceil_div(num: u32, den: u32) -> usize {
    ((num + den - 1) / den) as usize
}

impl Segmenter {
    /// Build a tracker for a scorer advancing `frame_shift` samples per frame.
    pub fn new(config: &VadConfig, frame_shift: usize) -> Self {
        let samples_per_ms = config.samples_per_ms().max(1);
        let frame_shift_ms = (frame_shift as u32 / samples_per_ms as u32).max(1);

        // Window sizes saturate at the 64-frame word so oversized configs
        // degrade to the widest representable window rather than a window
        // check that can never fire.
        let speech_window_frames =
            ceil_div(config.speech_window_size_ms, frame_shift_ms).min(64);
        let speech_threshold_frames = ceil_div(config.speech_window_threshold_ms, frame_shift_ms)
            .min(speech_window_frames);
        let silence_window_frames =
            ceil_div(config.silence_window_size_ms, frame_shift_ms).min(64);
        let silence_threshold_frames = ceil_div(config.silence_window_threshold_ms, frame_shift_ms)
            .min(silence_window_frames);

        let capacity = speech_window_frames.max(silence_window_frames);

        Self {
            threshold: config.threshold,
            frame_shift: frame_shift as i32,
            samples_per_ms,
            speech_window_frames,
            speech_threshold_frames,
            silence_window_frames,
            silence_threshold_frames,
            left_padding_samples: config.left_padding_ms as i32 * samples_per_ms,
            right_padding_samples: config.right_padding_ms as i32 * samples_per_ms,
            max_speech_samples: config.max_speech_ms as i32 * samples_per_ms,
            window: SlidingWindowBit::new(capacity),
            current: 0,
            last_end: 0,
            start: -1,
            seg_idx: 0,
            finished: Vec::new(),
        }
    }

    /// Feed one frame probability, advancing the stream by one frame shift.
    pub fn push_prob(&mut self, prob: f32) {
        self.current += self.frame_shift;
        self.window.push(prob > self.threshold);

        if self.start < 0 {
            if self
                .window
                .check_speech(self.speech_window_frames, self.speech_threshold_frames)
            {
                self.on_voice_start();
            }
        } else if self
            .window
            .check_silence(self.silence_window_frames, self.silence_threshold_frames)
        {
            self.on_voice_end();
        }

        // Split segments that exceed the configured maximum so continuous
        // speech never produces an unbounded segment.
        if self.start >= 0 && self.current - self.start > self.max_speech_samples {
            self.on_voice_end();
            self.on_voice_start();
        }
    }

    fn on_voice_start(&mut self) {
        let speech_frames = self.window.num_right_ones() as i32;
        let start = self.current - speech_frames * self.frame_shift - self.left_padding_samples;
        self.start = start.max(self.last_end);
        tracing::debug!(
            idx = self.seg_idx,
            start = self.start,
            current = self.current,
            "voice start"
        );
    }

    fn on_voice_end(&mut self) {
        let silence_frames = self.window.num_right_zeros() as i32;
        let end = (self.current - silence_frames * self.frame_shift + self.right_padding_samples)
            .min(self.current);
        tracing::debug!(
            idx = self.seg_idx,
            start = self.start,
            end,
            current = self.current,
            "voice end"
        );
        self.finished.push(VadSegment::closed(
            self.seg_idx,
            self.start,
            end,
            self.samples_per_ms,
        ));
        self.last_end = end;
        self.start = -1;
        self.seg_idx += 1;
    }

    /// Whether a segment is currently open.
    pub fn is_active(&self) -> bool {
        self.start >= 0
    }

    /// Absolute sample position of the next frame to be scored.
    pub fn current_sample(&self) -> i32 {
        self.current
    }

    /// Close any open segment into the finished buffer (end of stream).
    pub fn finish(&mut self) {
        if self.start >= 0 {
            self.on_voice_end();
        }
    }

    /// Close any open segment and hand it back directly.
    pub fn flush(&mut self) -> Option<VadSegment> {
        if self.start < 0 {
            return None;
        }
        self.on_voice_end();
        self.finished.pop()
    }

    /// Move out every segment finished since the previous drain.
    pub fn take_segments(&mut self) -> Vec<VadSegment> {
        std::mem::take(&mut self.finished)
    }

    /// Return to a fresh stream: positions zeroed, window emptied.
    pub fn reset(&mut self) {
        self.window.reset();
        self.current = 0;
        self.last_end = 0;
        self.start = -1;
        self.seg_idx = 0;
        self.finished.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Frame geometry of the Silero V4 backend at 16 kHz: one frame is
    // 512 samples = 32 ms. Default windows convert to 10/8 speech frames
    // and 19/16 silence frames.
    const SHIFT: usize = 512;

    fn segmenter() -> Segmenter {
        Segmenter::new(&VadConfig::default(), SHIFT)
    }

    fn feed(seg: &mut Segmenter, groups: &[(usize, f32)]) {
        for &(count, prob) in groups {
            for _ in 0..count {
                seg.push_prob(prob);
            }
        }
    }

    #[test]
    fn all_silence_emits_nothing() {
        let mut seg = segmenter();
        feed(&mut seg, &[(50, 0.1)]);
        seg.finish();
        assert!(seg.take_segments().is_empty());
    }

    #[test]
    fn single_utterance_is_positioned_with_padding() {
        let mut seg = segmenter();
        feed(&mut seg, &[(10, 0.1), (20, 0.9), (30, 0.1)]);
        seg.finish();

        let segs = seg.take_segments();
        assert_eq!(segs.len(), 1);
        let s = segs[0];
        assert_eq!(s.idx, 0);
        // Speech began at frame 10 (sample 5120); detection fired after the
        // 8th speech frame with 8 trailing ones, so the start lands at the
        // onset minus the 100 ms left padding.
        assert_eq!(s.start, 10 * 512 - 1_600);
        // Silence began at frame 30 (sample 15360); detection fired after 16
        // trailing zeros, so the end lands at the offset plus the padding.
        assert_eq!(s.end, 30 * 512 + 1_600);
        assert_eq!(s.start_ms, s.start / 16);
        assert_eq!(s.end_ms, s.end / 16);
    }

    #[test]
    fn long_speech_splits_at_max_duration() {
        let mut seg = segmenter();
        feed(&mut seg, &[(10, 0.1), (400, 0.9), (10, 0.1)]);
        seg.finish();

        let segs = seg.take_segments();
        assert_eq!(segs.len(), 2);
        let (a, b) = (segs[0], segs[1]);
        assert_eq!(a.idx, 0);
        assert_eq!(b.idx, 1);
        assert_eq!(a.start, 10 * 512 - 1_600);
        // The split closes at the first frame boundary past max_speech_ms
        // (clamped to current, so the right padding cannot reach into the
        // future) and the next segment starts exactly where it ended.
        assert_eq!(a.end, 320 * 512);
        assert_eq!(b.start, a.end);
        let dur = a.duration_samples().unwrap();
        assert!(dur > 160_000 && dur <= 160_000 + 512, "dur={dur}");
        // Closed by the end-of-stream flush: trailing 10 silence frames are
        // below the silence window threshold.
        assert_eq!(b.end, 410 * 512 + 1_600);
    }

    #[test]
    fn speech_shorter_than_the_window_is_dropped() {
        let mut seg = segmenter();
        feed(&mut seg, &[(10, 0.1), (5, 0.9), (10, 0.1)]);
        seg.finish();
        assert!(seg.take_segments().is_empty());
    }

    #[test]
    fn brief_silence_bridge_fuses_segments() {
        let mut seg = segmenter();
        feed(
            &mut seg,
            &[(10, 0.1), (20, 0.9), (5, 0.1), (20, 0.9), (10, 0.1)],
        );
        seg.finish();

        let segs = seg.take_segments();
        assert_eq!(segs.len(), 1, "5-frame bridge must not close the segment");
        assert_eq!(segs[0].start, 10 * 512 - 1_600);
        assert_eq!(segs[0].end, 55 * 512 + 1_600);
    }

    #[test]
    fn flush_closes_mid_speech_at_current() {
        let mut seg = segmenter();
        feed(&mut seg, &[(10, 0.1), (20, 0.9)]);
        assert!(seg.is_active());

        let s = seg.flush().expect("open segment must close");
        assert_eq!(s.start, 10 * 512 - 1_600);
        // No trailing silence: the padded end clamps to current.
        assert_eq!(s.end, seg.current_sample());
        assert!(!seg.is_active());
        assert!(seg.take_segments().is_empty());
        assert!(seg.flush().is_none(), "second flush closes nothing");
    }

    #[test]
    fn segments_are_ordered_and_non_overlapping() {
        let mut seg = segmenter();
        feed(
            &mut seg,
            &[
                (10, 0.1),
                (20, 0.9),
                (30, 0.1),
                (20, 0.9),
                (30, 0.1),
                (20, 0.9),
                (30, 0.1),
            ],
        );
        seg.finish();

        let segs = seg.take_segments();
        assert_eq!(segs.len(), 3);
        for pair in segs.windows(2) {
            assert_eq!(pair[1].idx, pair[0].idx + 1);
            assert!(pair[0].end <= pair[1].start);
        }
        for s in &segs {
            assert!(0 <= s.start && s.start < s.end);
            assert_eq!(s.start_ms, s.start * 1000 / 16_000);
            assert_eq!(s.end_ms, s.end * 1000 / 16_000);
        }
    }

    #[test]
    fn reset_restores_a_fresh_stream() {
        let mut seg = segmenter();
        feed(&mut seg, &[(10, 0.1), (20, 0.9), (30, 0.1)]);
        seg.finish();
        let first = seg.take_segments();

        seg.reset();
        assert_eq!(seg.current_sample(), 0);
        assert!(!seg.is_active());

        feed(&mut seg, &[(10, 0.1), (20, 0.9), (30, 0.1)]);
        seg.finish();
        let second = seg.take_segments();
        assert_eq!(first, second);
    }

    #[test]
    fn low_frame_rate_geometry_converts_windows() {
        // FSMN geometry: 10 ms shift at 16 kHz = 160 samples.
        let mut seg = Segmenter::new(&VadConfig::default(), 160);
        // 300 ms / 10 ms = 30-frame speech window, 25-frame threshold.
        feed(&mut seg, &[(40, 0.1), (30, 0.9), (70, 0.1)]);
        seg.finish();

        let segs = seg.take_segments();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start, 40 * 160 - 1_600);
        assert_eq!(segs[0].end, 70 * 160 + 1_600);
    }
}
