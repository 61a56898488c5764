//! Handle / instance facade over the neural backends.
//!
//! ## Lifecycle
//!
//! ```text
//! VadModel::create(path, threads, device)   → handle (shared scorer resources)
//!     └─► handle.init(config)               → VadStream (one logical stream)
//!         └─► stream.decode(samples, last)  → finished segments
//!             stream.flush() / stream.reset()
//! ```
//!
//! The handle owns nothing mutable: just the loaded session, port names and
//! the detected backend, all shared by `Arc` with every instance born from
//! it. Each instance owns its own recurrent tensors, smoothing window,
//! carry-over buffer and segment state, so instances on distinct streams
//! are completely independent (scoring serialises on the shared session).

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::backend::{
    self, FsmnScorer, ScorerResources, SileroV4Scorer, SileroV5Scorer, TenScorer, VadType,
};
use crate::config::VadConfig;
use crate::error::Result;
use crate::segment::VadSegment;
use crate::stream::{FrameStream, LfrStream};

/// Shared-resource factory for streaming VAD instances.
pub struct VadModel {
    resources: Arc<ScorerResources>,
}

impl VadModel {
    /// Load a model file and classify its backend by port signature.
    ///
    /// `device_id >= 0` selects a CUDA device (falling back to CPU when the
    /// provider is unavailable); `-1` selects CPU.
    ///
    /// # Errors
    /// - `VadError::ModelNotFound` if `path` does not exist.
    /// - `VadError::UnknownModelSignature` if the ports match no backend.
    /// - `VadError::OnnxSession` on loader failures.
    pub fn create(path: impl AsRef<Path>, num_threads: usize, device_id: i32) -> Result<Self> {
        let resources = backend::load_resources(path.as_ref(), num_threads, device_id)?;
        Ok(Self {
            resources: Arc::new(resources),
        })
    }

    /// Which backend the loaded model turned out to be.
    pub fn vad_type(&self) -> VadType {
        self.resources.vad_type
    }

    /// Build a fresh streaming instance for one logical stream.
    ///
    /// # Errors
    /// `VadError::UnsupportedSampleRate` if the backend cannot run at
    /// `config.sample_rate`.
    pub fn init(&self, config: VadConfig) -> Result<VadStream> {
        let resources = Arc::clone(&self.resources);
        let inner = match self.resources.vad_type {
            VadType::SileroV4 => StreamInner::SileroV4(FrameStream::new(
                SileroV4Scorer::new(resources, config.sample_rate)?,
                &config,
            )),
            VadType::SileroV5 => StreamInner::SileroV5(FrameStream::new(
                SileroV5Scorer::new(resources, config.sample_rate)?,
                &config,
            )),
            VadType::Ten => StreamInner::Ten(FrameStream::new(
                TenScorer::new(resources, config.sample_rate)?,
                &config,
            )),
            VadType::Fsmn => StreamInner::Fsmn(LfrStream::new(
                FsmnScorer::new(resources, config.sample_rate)?,
                &config,
            )),
        };
        info!(
            backend = %self.resources.vad_type,
            sample_rate = config.sample_rate,
            "VAD stream initialised"
        );
        Ok(VadStream { inner, config })
    }
}

enum StreamInner {
    SileroV4(FrameStream<SileroV4Scorer>),
    SileroV5(FrameStream<SileroV5Scorer>),
    Ten(FrameStream<TenScorer>),
    Fsmn(LfrStream<FsmnScorer>),
}

/// One streaming VAD instance: a scorer variant plus all mutable state for
/// a single logical stream.
pub struct VadStream {
    inner: StreamInner,
    config: VadConfig,
}

impl VadStream {
    /// Feed PCM samples (f32 in [-1, 1] at the configured sample rate) and
    /// collect every segment that finished during this call. Passing
    /// `is_last` closes the stream, flushing any open segment into the
    /// returned batch.
    ///
    /// # Errors
    /// Scorer failures are fatal; the instance must be `reset` or dropped.
    pub fn decode(&mut self, samples: &[f32], is_last: bool) -> Result<Vec<VadSegment>> {
        match &mut self.inner {
            StreamInner::SileroV4(s) => s.decode(samples, is_last),
            StreamInner::SileroV5(s) => s.decode(samples, is_last),
            StreamInner::Ten(s) => s.decode(samples, is_last),
            StreamInner::Fsmn(s) => s.decode(samples, is_last),
        }
    }

    /// Terminate the stream, closing and returning any open segment.
    pub fn flush(&mut self) -> Option<VadSegment> {
        match &mut self.inner {
            StreamInner::SileroV4(s) => s.flush(),
            StreamInner::SileroV5(s) => s.flush(),
            StreamInner::Ten(s) => s.flush(),
            StreamInner::Fsmn(s) => s.flush(),
        }
    }

    /// Return the instance to a fresh stream: recurrent tensors zeroed,
    /// positions and buffers cleared.
    pub fn reset(&mut self) {
        match &mut self.inner {
            StreamInner::SileroV4(s) => s.reset(),
            StreamInner::SileroV5(s) => s.reset(),
            StreamInner::Ten(s) => s.reset(),
            StreamInner::Fsmn(s) => s.reset(),
        }
    }

    pub fn vad_type(&self) -> VadType {
        match &self.inner {
            StreamInner::SileroV4(_) => VadType::SileroV4,
            StreamInner::SileroV5(_) => VadType::SileroV5,
            StreamInner::Ten(_) => VadType::Ten,
            StreamInner::Fsmn(_) => VadType::Fsmn,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Frame shift of the active backend, in milliseconds.
    pub fn frame_shift_ms(&self) -> u32 {
        (self.frame_shift_samples() * 1000 / self.config.sample_rate as usize) as u32
    }

    /// Frame length of the active backend, in milliseconds.
    pub fn frame_length_ms(&self) -> u32 {
        let samples = match &self.inner {
            StreamInner::SileroV4(s) => s.frame_length(),
            StreamInner::SileroV5(s) => s.frame_length(),
            StreamInner::Ten(s) => s.frame_length(),
            StreamInner::Fsmn(s) => s.frame_length(),
        };
        (samples * 1000 / self.config.sample_rate as usize) as u32
    }

    fn frame_shift_samples(&self) -> usize {
        match &self.inner {
            StreamInner::SileroV4(s) => s.frame_shift(),
            StreamInner::SileroV5(s) => s.frame_shift(),
            StreamInner::Ten(s) => s.frame_shift(),
            StreamInner::Fsmn(s) => s.frame_shift(),
        }
    }
}
