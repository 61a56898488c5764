//! FSMN VAD scorer (FunASR export) with low-frame-rate batched inference.
//!
//! The exported graph embeds the fbank frontend: it takes raw waveform
//! `speech [1, N]`, four FSMN cache tensors `[1, 128, 19, 1]`, and two
//! rank-0 i64 padding flags, and returns `logits [1, T]` (one noise
//! probability per 10 ms output frame) plus the updated caches.
//!
//! The logits are noise probabilities; callers always receive the speech
//! probability `1 - p_noise`.

use std::sync::Arc;

use ndarray::{arr0, Array2, Array4};
use ort::session::SessionInputValue;
use ort::value::Value;

use crate::error::{Result, VadError};
use crate::scorer::ChunkScorer;

use super::ScorerResources;

/// Cache tensor shape `[1, 128, 19, 1]`.
const CACHE_SHAPE: (usize, usize, usize, usize) = (1, 128, 19, 1);
const CACHE_LEN: usize = 128 * 19;
const NUM_CACHES: usize = 4;

const FRAME_SHIFT_MS: usize = 10;
const FRAME_LENGTH_MS: usize = 25;

fn onnx_err(e: impl std::fmt::Display) -> VadError {
    VadError::OnnxSession(e.to_string())
}

pub struct FsmnScorer {
    resources: Arc<ScorerResources>,
    frame_shift: usize,
    frame_length: usize,
    caches: Vec<Vec<f32>>,
}

impl FsmnScorer {
    pub fn new(resources: Arc<ScorerResources>, sample_rate: u32) -> Result<Self> {
        if !matches!(sample_rate, 8_000 | 16_000) {
            return Err(VadError::UnsupportedSampleRate {
                backend: "fsmn",
                sample_rate,
            });
        }
        let samples_per_ms = sample_rate as usize / 1000;
        Ok(Self {
            resources,
            frame_shift: FRAME_SHIFT_MS * samples_per_ms,
            frame_length: FRAME_LENGTH_MS * samples_per_ms,
            caches: vec![vec![0.0; CACHE_LEN]; NUM_CACHES],
        })
    }
}

impl ChunkScorer for FsmnScorer {
    fn frame_shift(&self) -> usize {
        self.frame_shift
    }

    fn frame_length(&self) -> usize {
        self.frame_length
    }

    fn reset(&mut self) {
        for cache in &mut self.caches {
            cache.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    fn score_chunk(
        &mut self,
        samples: &[f32],
        first_padding: i64,
        last_padding: i64,
    ) -> Result<Vec<f32>> {
        let speech = Array2::<f32>::from_shape_vec((1, samples.len()), samples.to_vec())
            .map_err(onnx_err)?;

        let mut inputs: Vec<(String, SessionInputValue<'_>)> = Vec::with_capacity(7);
        inputs.push((
            "speech".into(),
            Value::from_array(speech).map_err(onnx_err)?.into(),
        ));
        for (i, cache) in self.caches.iter().enumerate() {
            let arr =
                Array4::<f32>::from_shape_vec(CACHE_SHAPE, cache.clone()).map_err(onnx_err)?;
            inputs.push((
                format!("in_cache{i}"),
                Value::from_array(arr).map_err(onnx_err)?.into(),
            ));
        }
        inputs.push((
            "first_padding".into(),
            Value::from_array(arr0(first_padding)).map_err(onnx_err)?.into(),
        ));
        inputs.push((
            "last_padding".into(),
            Value::from_array(arr0(last_padding)).map_err(onnx_err)?.into(),
        ));

        let cache_out_names: Vec<String> = self.resources.output_names[1..].to_vec();

        let mut session = self.resources.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| VadError::Inference(e.to_string()))?;

        for (cache, name) in self.caches.iter_mut().zip(&cache_out_names) {
            let (_, data) = outputs[name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(onnx_err)?;
            *cache = data.to_vec();
        }

        let (_, logits) = outputs["logits"]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;

        Ok(logits.iter().map(|&p_noise| 1.0 - p_noise).collect())
    }
}
