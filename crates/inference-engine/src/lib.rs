//! ONNX Inference Engine
//!
//! Provides ML inference using tract-onnx. Models are exposed through three
//! capabilities: [`Classifier`], [`Regressor`] and [`Detector`]. Each is
//! read-only once loaded and safe to share across threads.

mod detector;
mod engine;
mod tabular;

pub use detector::{decode_predictions, letterbox, Detection, Detector, OnnxDetector};
pub use engine::{ModelOutput, OnnxModel};
pub use tabular::{Classifier, OnnxClassifier, OnnxRegressor, Regressor};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
}

/// Path of a model under `testdata/`
#[cfg(test)]
pub(crate) fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}
