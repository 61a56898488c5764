//! The externally visible unit of output: a time-stamped speech segment.

use serde::{Deserialize, Serialize};

/// A half-open speech interval `[start, end)` in absolute sample indices
/// counted from the start of the stream (since the last `reset()`).
///
/// `end`/`end_ms` carry the sentinel `-1` while a segment is still open;
/// segments returned from `decode` are always closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VadSegment {
    /// Monotonically increasing segment index.
    pub idx: i32,
    /// Start position in samples.
    pub start: i32,
    /// End position in samples, or -1 while open.
    pub end: i32,
    /// Start position in milliseconds (`start * 1000 / sample_rate`, integer).
    pub start_ms: i32,
    /// End position in milliseconds, or -1 while open.
    pub end_ms: i32,
}

impl VadSegment {
    pub(crate) fn closed(idx: i32, start: i32, end: i32, samples_per_ms: i32) -> Self {
        Self {
            idx,
            start,
            end,
            start_ms: start / samples_per_ms,
            end_ms: end / samples_per_ms,
        }
    }

    /// Whether the segment is still open (no end decided yet).
    pub fn is_open(&self) -> bool {
        self.end < 0
    }

    /// Segment duration in samples; `None` while open.
    pub fn duration_samples(&self) -> Option<i32> {
        (!self.is_open()).then(|| self.end - self.start)
    }

    /// Segment duration in milliseconds; `None` while open.
    pub fn duration_ms(&self) -> Option<i32> {
        (!self.is_open()).then(|| self.end_ms - self.start_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_segment_derives_millisecond_positions() {
        let seg = VadSegment::closed(0, 3_520, 17_984, 16);
        assert_eq!(seg.start_ms, 220);
        assert_eq!(seg.end_ms, 1_124);
        assert!(!seg.is_open());
        assert_eq!(seg.duration_samples(), Some(14_464));
        assert_eq!(seg.duration_ms(), Some(904));
    }

    #[test]
    fn segment_serializes_round_trip() {
        let seg = VadSegment::closed(3, 16_000, 48_000, 16);
        let json = serde_json::to_value(seg).expect("serialize segment");
        assert_eq!(json["idx"], 3);
        assert_eq!(json["start"], 16_000);
        assert_eq!(json["end"], 48_000);
        assert_eq!(json["start_ms"], 1_000);
        assert_eq!(json["end_ms"], 3_000);

        let back: VadSegment = serde_json::from_value(json).expect("deserialize segment");
        assert_eq!(back, seg);
    }
}
