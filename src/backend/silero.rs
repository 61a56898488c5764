//! Silero VAD scorers.
//!
//! Wraps the ONNX models published at <https://github.com/snakers4/silero-vad>.
//!
//! ## Model I/O (V4, LSTM)
//!
//! | Name     | Shape       | DType | Direction |
//! |----------|-------------|-------|-----------|
//! | `input`  | `[1, 512]`  | f32   | in        |
//! | `sr`     | `[1]`       | i64   | in        |
//! | `h`, `c` | `[2,1,64]`  | f32   | in        |
//! | `output` | `[1, 1]`    | f32   | out       |
//! | `hn`,`cn`| `[2,1,64]`  | f32   | out       |
//!
//! ## Model I/O (V5, fused state)
//!
//! | Name     | Shape       | DType | Direction |
//! |----------|-------------|-------|-----------|
//! | `input`  | `[1, N]`    | f32   | in        |
//! | `state`  | `[2,1,128]` | f32   | in        |
//! | `sr`     | `[1]`       | i64   | in        |
//! | `output` | `[1, 1]`    | f32   | out       |
//! | `stateN` | `[2,1,128]` | f32   | out       |
//!
//! V5 scores a context-prefixed frame: 64 samples of look-behind at 16 kHz
//! (32 at 8 kHz) on top of the shift, so consecutive frames overlap by the
//! context length.

use std::sync::Arc;

use ndarray::{Array1, Array2, Array3};
use ort::value::Value;

use crate::error::{Result, VadError};
use crate::scorer::FrameScorer;

use super::ScorerResources;

/// V4 LSTM state: 2 layers x 1 batch x 64 units.
const LSTM_STATE_LEN: usize = 2 * 64;
/// V5 fused state: 2 layers x 1 batch x 128 units.
const FUSED_STATE_LEN: usize = 2 * 128;

fn onnx_err(e: impl std::fmt::Display) -> VadError {
    VadError::OnnxSession(e.to_string())
}

/// Silero V4: separate `h`/`c` LSTM state tensors, fixed 512-sample frames.
pub struct SileroV4Scorer {
    resources: Arc<ScorerResources>,
    sample_rate: u32,
    h: Vec<f32>,
    c: Vec<f32>,
}

impl SileroV4Scorer {
    pub fn new(resources: Arc<ScorerResources>, sample_rate: u32) -> Result<Self> {
        if !matches!(sample_rate, 8_000 | 16_000) {
            return Err(VadError::UnsupportedSampleRate {
                backend: "silero-v4",
                sample_rate,
            });
        }
        Ok(Self {
            resources,
            sample_rate,
            h: vec![0.0; LSTM_STATE_LEN],
            c: vec![0.0; LSTM_STATE_LEN],
        })
    }
}

impl FrameScorer for SileroV4Scorer {
    fn frame_shift(&self) -> usize {
        512
    }

    fn frame_length(&self) -> usize {
        512
    }

    fn reset(&mut self) {
        self.h.iter_mut().for_each(|v| *v = 0.0);
        self.c.iter_mut().for_each(|v| *v = 0.0);
    }

    fn score(&mut self, frame: &[f32]) -> Result<f32> {
        debug_assert_eq!(frame.len(), self.frame_length());

        let input = Array2::<f32>::from_shape_vec((1, frame.len()), frame.to_vec())
            .map_err(onnx_err)?;
        let sr = Array1::<i64>::from_elem(1, i64::from(self.sample_rate));
        let h = Array3::<f32>::from_shape_vec((2, 1, 64), self.h.clone()).map_err(onnx_err)?;
        let c = Array3::<f32>::from_shape_vec((2, 1, 64), self.c.clone()).map_err(onnx_err)?;

        let mut session = self.resources.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input" => Value::from_array(input).map_err(onnx_err)?,
                "sr"    => Value::from_array(sr).map_err(onnx_err)?,
                "h"     => Value::from_array(h).map_err(onnx_err)?,
                "c"     => Value::from_array(c).map_err(onnx_err)?,
            ])
            .map_err(|e| VadError::Inference(e.to_string()))?;

        let (_, prob_data) = outputs["output"]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        let prob = prob_data.first().copied().unwrap_or(0.0);

        let (_, hn) = outputs["hn"].try_extract_tensor::<f32>().map_err(onnx_err)?;
        let (_, cn) = outputs["cn"].try_extract_tensor::<f32>().map_err(onnx_err)?;
        self.h = hn.to_vec();
        self.c = cn.to_vec();

        Ok(prob)
    }
}

/// Silero V5: one fused `state` tensor and a context-prefixed frame.
pub struct SileroV5Scorer {
    resources: Arc<ScorerResources>,
    sample_rate: u32,
    frame_shift: usize,
    context: usize,
    state: Vec<f32>,
}

impl SileroV5Scorer {
    pub fn new(resources: Arc<ScorerResources>, sample_rate: u32) -> Result<Self> {
        let (frame_shift, context) = match sample_rate {
            8_000 => (256, 32),
            16_000 => (512, 64),
            _ => {
                return Err(VadError::UnsupportedSampleRate {
                    backend: "silero-v5",
                    sample_rate,
                })
            }
        };
        Ok(Self {
            resources,
            sample_rate,
            frame_shift,
            context,
            state: vec![0.0; FUSED_STATE_LEN],
        })
    }
}

impl FrameScorer for SileroV5Scorer {
    fn frame_shift(&self) -> usize {
        self.frame_shift
    }

    fn frame_length(&self) -> usize {
        self.frame_shift + self.context
    }

    fn reset(&mut self) {
        self.state.iter_mut().for_each(|v| *v = 0.0);
    }

    fn score(&mut self, frame: &[f32]) -> Result<f32> {
        debug_assert_eq!(frame.len(), self.frame_length());

        let input = Array2::<f32>::from_shape_vec((1, frame.len()), frame.to_vec())
            .map_err(onnx_err)?;
        let state =
            Array3::<f32>::from_shape_vec((2, 1, 128), self.state.clone()).map_err(onnx_err)?;
        let sr = Array1::<i64>::from_elem(1, i64::from(self.sample_rate));

        let mut session = self.resources.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input" => Value::from_array(input).map_err(onnx_err)?,
                "state" => Value::from_array(state).map_err(onnx_err)?,
                "sr"    => Value::from_array(sr).map_err(onnx_err)?,
            ])
            .map_err(|e| VadError::Inference(e.to_string()))?;

        let (_, prob_data) = outputs["output"]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        let prob = prob_data.first().copied().unwrap_or(0.0);

        let (_, state_out) = outputs["stateN"]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        self.state = state_out.to_vec();

        Ok(prob)
    }
}
