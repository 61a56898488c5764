//! End-to-end streaming laws driven through scripted scorers.

use voxseg::{FrameScorer, FrameStream, Result, VadConfig, VadSegment};

/// Hands out a fixed probability per frame in order, independent of how the
/// audio was chunked on the way in.
struct SequencedScorer {
    shift: usize,
    length: usize,
    probs: Vec<f32>,
    cursor: usize,
}

impl SequencedScorer {
    fn new(shift: usize, length: usize, probs: Vec<f32>) -> Self {
        Self {
            shift,
            length,
            probs,
            cursor: 0,
        }
    }
}

impl FrameScorer for SequencedScorer {
    fn frame_shift(&self) -> usize {
        self.shift
    }

    fn frame_length(&self) -> usize {
        self.length
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn score(&mut self, frame: &[f32]) -> Result<f32> {
        assert_eq!(frame.len(), self.length);
        let p = self.probs.get(self.cursor).copied().unwrap_or(0.0);
        self.cursor += 1;
        Ok(p)
    }
}

fn prob_script(groups: &[(usize, f32)]) -> Vec<f32> {
    let mut out = Vec::new();
    for &(count, prob) in groups {
        out.extend(std::iter::repeat(prob).take(count));
    }
    out
}

fn run_chunked(
    probs: Vec<f32>,
    chunk_samples: usize,
    config: &VadConfig,
) -> Vec<VadSegment> {
    let total = probs.len() * 512;
    let audio = vec![0.0f32; total];
    let mut stream = FrameStream::new(SequencedScorer::new(512, 512, probs), config);

    let mut segs = Vec::new();
    let mut fed = 0;
    while fed < total {
        let n = chunk_samples.min(total - fed);
        let is_last = fed + n == total;
        segs.extend(
            stream
                .decode(&audio[fed..fed + n], is_last)
                .expect("scripted decode cannot fail"),
        );
        fed += n;
    }
    segs
}

#[test]
fn chunking_is_invisible_in_the_output() {
    let script = prob_script(&[
        (10, 0.1),
        (20, 0.9),
        (30, 0.1),
        (12, 0.9),
        (40, 0.1),
        (25, 0.9),
        (20, 0.1),
    ]);
    let config = VadConfig::default();

    let whole = run_chunked(script.clone(), script.len() * 512, &config);
    let hundred_ms = run_chunked(script.clone(), 1_600, &config);
    let one_ms = run_chunked(script.clone(), 16, &config);
    let ragged = run_chunked(script, 1_234, &config);

    assert!(!whole.is_empty());
    assert_eq!(whole, hundred_ms);
    assert_eq!(whole, one_ms);
    assert_eq!(whole, ragged);
}

#[test]
fn emitted_segments_are_strictly_ordered() {
    let script = prob_script(&[
        (10, 0.1),
        (20, 0.9),
        (30, 0.1),
        (20, 0.9),
        (30, 0.1),
        (20, 0.9),
        (30, 0.1),
    ]);
    let segs = run_chunked(script, 1_600, &VadConfig::default());

    assert_eq!(segs.len(), 3);
    assert_eq!(segs[0].idx, 0);
    for pair in segs.windows(2) {
        assert_eq!(pair[1].idx, pair[0].idx + 1);
        assert!(pair[0].end <= pair[1].start, "segments must not overlap");
    }
    for seg in &segs {
        assert!(0 <= seg.start && seg.start < seg.end);
        assert_eq!(seg.start_ms, seg.start * 1000 / 16_000);
        assert_eq!(seg.end_ms, seg.end * 1000 / 16_000);
    }
}

#[test]
fn continuous_speech_splits_back_to_back() {
    let config = VadConfig::default();
    let segs = run_chunked(prob_script(&[(700, 0.9)]), 1_600, &config);

    assert_eq!(segs.len(), 3);
    // With speech from the first sample, the clamped start is the origin.
    assert_eq!(segs[0].start, 0);
    for pair in segs.windows(2) {
        assert_eq!(
            pair[0].end, pair[1].start,
            "split segments must be contiguous"
        );
    }

    let max_samples = config.max_speech_ms as i32 * 16;
    let pad_samples = config.right_padding_ms as i32 * 16;
    for seg in &segs {
        let dur = seg.end - seg.start;
        assert!(
            dur <= max_samples + pad_samples + 512,
            "segment {} runs {dur} samples",
            seg.idx
        );
    }
    // Split boundaries land within one frame of the max-duration multiples.
    assert!((segs[0].end - max_samples).unsigned_abs() <= 512);
    assert!((segs[1].end - 2 * max_samples).unsigned_abs() <= 512);
}

#[test]
fn all_silence_stays_silent() {
    let segs = run_chunked(prob_script(&[(200, 0.1)]), 1_600, &VadConfig::default());
    assert!(segs.is_empty());
}

#[test]
fn flush_is_idempotent_after_stream_end() {
    let script = prob_script(&[(10, 0.1), (20, 0.9)]);
    let total = script.len() * 512;
    let mut stream = FrameStream::new(
        SequencedScorer::new(512, 512, script),
        &VadConfig::default(),
    );

    // Feed without EOS: speech is still open, so nothing is emitted yet.
    let mid = stream
        .decode(&vec![0.0; total], false)
        .expect("scripted decode cannot fail");
    assert!(mid.is_empty(), "open segments must not leak from decode");

    let first = stream.flush().expect("flush must close the open segment");
    assert!(first.end > first.start);
    assert!(stream.flush().is_none(), "second flush closes nothing");
    assert!(stream.flush().is_none());
}

#[test]
fn reset_behaves_like_a_fresh_instance() {
    let script = prob_script(&[(10, 0.1), (20, 0.9), (30, 0.1)]);
    let total = script.len() * 512;
    let audio = vec![0.0f32; total];

    let mut stream = FrameStream::new(
        SequencedScorer::new(512, 512, script.clone()),
        &VadConfig::default(),
    );
    let first = stream.decode(&audio, true).expect("decode");

    stream.reset();
    let after_reset = stream.decode(&audio, true).expect("decode");

    let mut fresh = FrameStream::new(
        SequencedScorer::new(512, 512, script),
        &VadConfig::default(),
    );
    let from_fresh = fresh.decode(&audio, true).expect("decode");

    assert_eq!(first, after_reset);
    assert_eq!(first, from_fresh);
    assert_eq!(after_reset[0].idx, 0, "indices restart after reset");
}

#[test]
fn empty_final_call_still_flushes() {
    let script = prob_script(&[(10, 0.1), (20, 0.9)]);
    let total = script.len() * 512;
    let mut stream = FrameStream::new(
        SequencedScorer::new(512, 512, script),
        &VadConfig::default(),
    );

    stream.decode(&vec![0.0; total], false).expect("decode");
    let segs = stream.decode(&[], true).expect("decode");
    assert_eq!(segs.len(), 1);
    assert!(segs[0].end > segs[0].start);
}
