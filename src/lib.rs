//! # voxseg
//!
//! Streaming voice activity detection: raw PCM chunks in, time-stamped
//! speech segments out, decided as soon as the smoothing windows allow.
//!
//! ## Architecture
//!
//! ```text
//! PCM chunks ─► FrameStream / LfrStream (framing, reminder carry-over)
//!                      │
//!               FrameScorer / ChunkScorer (Silero V4/V5, FSMN, TEN over ort)
//!                      │ per-frame speech probability
//!               Segmenter (SlidingWindowBit smoothing, padding, max-split)
//!                      │
//!               Vec<VadSegment> drained per decode() call
//! ```
//!
//! The neural backends live behind the default-on `onnx` feature; without
//! it the framing layer, segment state machine and scorer contracts remain
//! available for embedding a custom scorer.
//!
//! ## Usage
//!
//! ```no_run
//! use voxseg::{VadConfig, VadModel};
//!
//! # fn main() -> voxseg::Result<()> {
//! let handle = VadModel::create("silero_vad.onnx", 1, -1)?;
//! let mut stream = handle.init(VadConfig::default())?;
//! # let chunk = vec![0.0f32; 1600];
//! for seg in stream.decode(&chunk, false)? {
//!     println!("[{} ms .. {} ms]", seg.start_ms, seg.end_ms);
//! }
//! if let Some(tail) = stream.flush() {
//!     println!("open at EOS: [{} ms .. {} ms]", tail.start_ms, tail.end_ms);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod scorer;
pub mod segment;
pub mod segmenter;
pub mod stream;
pub mod window;

#[cfg(feature = "onnx")]
pub mod backend;
#[cfg(feature = "onnx")]
pub mod model;

// Convenience re-exports for downstream crates
pub use config::VadConfig;
pub use error::{Result, VadError};
pub use scorer::{ChunkScorer, FrameScorer};
pub use segment::VadSegment;
pub use stream::{FrameStream, LfrStream};
pub use window::SlidingWindowBit;

#[cfg(feature = "onnx")]
pub use backend::VadType;
#[cfg(feature = "onnx")]
pub use model::{VadModel, VadStream};
