//! ONNX Runtime glue shared by every neural backend.
//!
//! A model file is classified by the exact list of input/output ports it
//! declares:
//!
//! | backend   | inputs | outputs |
//! |-----------|--------|---------|
//! | Silero V4 | `input, sr, h, c` | `output, hn, cn` |
//! | Silero V5 | `input, state, sr` | `output, stateN` |
//! | FSMN      | `speech, in_cache0..3, first_padding, last_padding` | `logits` + 4 caches |
//! | TEN       | 6 inputs | 6 outputs |
//!
//! Anything else is rejected at handle creation. The loaded session plus the
//! declared port names form the immutable resource bundle shared (via `Arc`)
//! by every stream instance born from one handle.

pub mod fsmn;
pub mod silero;
pub mod ten;

use std::path::Path;

use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, VadError};

pub use fsmn::FsmnScorer;
pub use silero::{SileroV4Scorer, SileroV5Scorer};
pub use ten::TenScorer;

/// Which neural backend a loaded model file turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VadType {
    SileroV4,
    SileroV5,
    Fsmn,
    Ten,
}

impl std::fmt::Display for VadType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VadType::SileroV4 => "silero-v4",
            VadType::SileroV5 => "silero-v5",
            VadType::Fsmn => "fsmn",
            VadType::Ten => "ten",
        };
        f.write_str(name)
    }
}

/// Immutable scorer resources shared by all instances of one handle.
///
/// The session sits behind a `parking_lot::Mutex` because `ort` requires
/// `&mut` for `run`; instances otherwise own all of their mutable state.
pub struct ScorerResources {
    pub(crate) session: Mutex<Session>,
    pub(crate) vad_type: VadType,
    pub(crate) input_names: Vec<String>,
    pub(crate) output_names: Vec<String>,
}

fn is_silero_v4(inputs: &[String], outputs: &[String]) -> bool {
    inputs == ["input", "sr", "h", "c"] && outputs == ["output", "hn", "cn"]
}

fn is_silero_v5(inputs: &[String], outputs: &[String]) -> bool {
    inputs == ["input", "state", "sr"] && outputs == ["output", "stateN"]
}

fn is_fsmn(inputs: &[String], outputs: &[String]) -> bool {
    inputs
        == [
            "speech",
            "in_cache0",
            "in_cache1",
            "in_cache2",
            "in_cache3",
            "first_padding",
            "last_padding",
        ]
        && outputs.len() == 5
        && outputs[0] == "logits"
}

fn is_ten(inputs: &[String], outputs: &[String]) -> bool {
    inputs.len() == 6 && outputs.len() == 6
}

/// Classify a model by its declared port lists.
pub(crate) fn classify_ports(inputs: &[String], outputs: &[String]) -> Option<VadType> {
    if is_silero_v4(inputs, outputs) {
        Some(VadType::SileroV4)
    } else if is_silero_v5(inputs, outputs) {
        Some(VadType::SileroV5)
    } else if is_fsmn(inputs, outputs) {
        Some(VadType::Fsmn)
    } else if is_ten(inputs, outputs) {
        Some(VadType::Ten)
    } else {
        None
    }
}

fn build_session(path: &Path, num_threads: usize, device_id: i32) -> Result<Session> {
    let num_threads = num_threads.clamp(1, 32);
    let mut builder = SessionBuilder::new()
        .map_err(|e| VadError::OnnxSession(e.to_string()))?
        .with_intra_threads(num_threads)
        .map_err(|e| VadError::OnnxSession(e.to_string()))?
        .with_inter_threads(num_threads)
        .map_err(|e| VadError::OnnxSession(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::All)
        .map_err(|e| VadError::OnnxSession(e.to_string()))?;

    if device_id >= 0 {
        info!(device_id, "initialising ONNX session on CUDA");
        builder = builder
            .with_execution_providers([
                ort::ep::CUDA::default()
                    .with_device_id(device_id)
                    .build()
                    .fail_silently(),
                ort::ep::CPU::default().build(),
            ])
            .map_err(|e| VadError::OnnxSession(e.to_string()))?;
    } else {
        info!("initialising ONNX session on CPU");
        builder = builder
            .with_execution_providers([ort::ep::CPU::default().build()])
            .map_err(|e| VadError::OnnxSession(e.to_string()))?;
    }

    builder
        .commit_from_file(path)
        .map_err(|e| VadError::OnnxSession(e.to_string()))
}

/// Load a model file, introspect its ports and classify the backend.
pub(crate) fn load_resources(
    path: &Path,
    num_threads: usize,
    device_id: i32,
) -> Result<ScorerResources> {
    if !path.exists() {
        return Err(VadError::ModelNotFound {
            path: path.to_path_buf(),
        });
    }

    let size_mb = std::fs::metadata(path)
        .map(|m| m.len() as f64 / 1_048_576.0)
        .unwrap_or(0.0);

    info!("=== VAD model startup report ===");
    info!("  path: {:?}", path);
    info!("  size: {:.2} MB", size_mb);

    let session = build_session(path, num_threads, device_id)?;

    let input_names: Vec<String> = session
        .inputs()
        .iter()
        .map(|outlet| outlet.name().to_string())
        .collect();
    let output_names: Vec<String> = session
        .outputs()
        .iter()
        .map(|outlet| outlet.name().to_string())
        .collect();

    info!("  inputs: {:?}", input_names);
    info!("  outputs: {:?}", output_names);

    let vad_type = classify_ports(&input_names, &output_names).ok_or_else(|| {
        VadError::UnknownModelSignature {
            path: path.to_path_buf(),
            inputs: input_names.clone(),
            outputs: output_names.clone(),
        }
    })?;

    info!("  backend: {vad_type}");
    info!("=== VAD model ready ===");

    Ok(ScorerResources {
        session: Mutex::new(session),
        vad_type,
        input_names,
        output_names,
    })
}
