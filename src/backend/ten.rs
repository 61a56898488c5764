//! TEN VAD scorer: two LSTM state pairs plus a convolutional feature cache.
//!
//! The model declares six inputs (`input, h1, c1, h2, c2, cache`) and six
//! outputs (`prob` plus the five updated states); detection is by port
//! count, so the names are taken from the session rather than hard-coded.
//! Frames are 768 samples advancing by 256, the longest overlap of the
//! supported backends.

use std::sync::Arc;

use ndarray::{Array2, Array3};
use ort::session::SessionInputValue;
use ort::value::Value;

use crate::error::{Result, VadError};
use crate::scorer::FrameScorer;

use super::ScorerResources;

/// LSTM state shape `[1, 64]`.
const STATE_LEN: usize = 64;
/// Conv cache shape `[1, 2, 41]`.
const CACHE_LEN: usize = 2 * 41;

const FRAME_SHIFT: usize = 256;
const FRAME_LENGTH: usize = 768;

fn onnx_err(e: impl std::fmt::Display) -> VadError {
    VadError::OnnxSession(e.to_string())
}

pub struct TenScorer {
    resources: Arc<ScorerResources>,
    /// `h1, c1, h2, c2` in declaration order.
    states: [Vec<f32>; 4],
    conv_cache: Vec<f32>,
}

impl TenScorer {
    pub fn new(resources: Arc<ScorerResources>, sample_rate: u32) -> Result<Self> {
        if sample_rate != 16_000 {
            return Err(VadError::UnsupportedSampleRate {
                backend: "ten",
                sample_rate,
            });
        }
        Ok(Self {
            resources,
            states: std::array::from_fn(|_| vec![0.0; STATE_LEN]),
            conv_cache: vec![0.0; CACHE_LEN],
        })
    }
}

impl FrameScorer for TenScorer {
    fn frame_shift(&self) -> usize {
        FRAME_SHIFT
    }

    fn frame_length(&self) -> usize {
        FRAME_LENGTH
    }

    fn reset(&mut self) {
        for state in &mut self.states {
            state.iter_mut().for_each(|v| *v = 0.0);
        }
        self.conv_cache.iter_mut().for_each(|v| *v = 0.0);
    }

    fn score(&mut self, frame: &[f32]) -> Result<f32> {
        debug_assert_eq!(frame.len(), FRAME_LENGTH);

        let input = Array2::<f32>::from_shape_vec((1, frame.len()), frame.to_vec())
            .map_err(onnx_err)?;

        let input_names = self.resources.input_names.clone();
        let output_names = self.resources.output_names.clone();

        let mut inputs: Vec<(String, SessionInputValue<'_>)> = Vec::with_capacity(6);
        inputs.push((
            input_names[0].clone(),
            Value::from_array(input).map_err(onnx_err)?.into(),
        ));
        for (state, name) in self.states.iter().zip(&input_names[1..5]) {
            let arr = Array2::<f32>::from_shape_vec((1, STATE_LEN), state.clone())
                .map_err(onnx_err)?;
            inputs.push((
                name.clone(),
                Value::from_array(arr).map_err(onnx_err)?.into(),
            ));
        }
        let cache = Array3::<f32>::from_shape_vec((1, 2, 41), self.conv_cache.clone())
            .map_err(onnx_err)?;
        inputs.push((
            input_names[5].clone(),
            Value::from_array(cache).map_err(onnx_err)?.into(),
        ));

        let mut session = self.resources.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| VadError::Inference(e.to_string()))?;

        let (_, prob_data) = outputs[output_names[0].as_str()]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        let prob = prob_data.first().copied().unwrap_or(0.0);

        for (state, name) in self.states.iter_mut().zip(&output_names[1..5]) {
            let (_, data) = outputs[name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(onnx_err)?;
            *state = data.to_vec();
        }
        let (_, cache_out) = outputs[output_names[5].as_str()]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;
        self.conv_cache = cache_out.to_vec();

        Ok(prob)
    }
}
