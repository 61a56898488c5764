use thiserror::Error;

/// All errors produced by voxseg.
#[derive(Debug, Error)]
pub enum VadError {
    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("unrecognised VAD model signature in {path} (inputs: {inputs:?}, outputs: {outputs:?})")]
    UnknownModelSignature {
        path: std::path::PathBuf,
        inputs: Vec<String>,
        outputs: Vec<String>,
    },

    #[error("{backend} does not support sample rate {sample_rate} Hz")]
    UnsupportedSampleRate {
        backend: &'static str,
        sample_rate: u32,
    },

    #[error("inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VadError>;
