//! Inference Engine Implementation

use crate::InferenceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// One output tensor of a model run, cast to `f32`
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Tensor shape
    pub shape: Vec<usize>,
    /// Row-major tensor data
    pub data: Vec<f32>,
}

/// ONNX model loaded into an optimized tract plan.
///
/// The plan is immutable after loading; `run` borrows it shared, so one
/// model can serve concurrent requests without locking.
pub struct OnnxModel {
    /// Model path
    path: PathBuf,
    /// Fixed input shape the plan was optimized for
    input_shape: Vec<usize>,
    plan: Plan,
}

impl OnnxModel {
    /// Load and optimize an ONNX model with a fixed `f32` input shape
    pub fn load(path: impl AsRef<Path>, input_shape: &[usize]) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX model {} with input shape {:?}", path.display(), input_shape);

        let plan = build_plan(path, input_shape).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
        })?;

        info!("Model {} loaded successfully", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            input_shape: input_shape.to_vec(),
            plan,
        })
    }

    /// Run the model on a flat input buffer and return the requested output
    pub fn run(&self, input: &[f32], output: usize) -> Result<ModelOutput, InferenceError> {
        let expected: usize = self.input_shape.iter().product();
        if input.len() != expected {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{:?} ({} values)", self.input_shape, expected),
                actual: format!("{} values", input.len()),
            });
        }

        let start = std::time::Instant::now();
        let tensor = Tensor::from_shape(&self.input_shape, input)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let value = outputs.get(output).ok_or_else(|| {
            InferenceError::InferenceFailed(format!(
                "model has {} outputs, output {} requested",
                outputs.len(),
                output
            ))
        })?;
        let cast = value
            .cast_to::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        let data = cast
            .as_slice::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
            .to_vec();

        debug!(
            "Inference on {} completed in {}ms",
            self.path.display(),
            start.elapsed().as_millis()
        );

        Ok(ModelOutput {
            shape: cast.shape().to_vec(),
            data,
        })
    }
}

fn build_plan(path: &Path, input_shape: &[usize]) -> TractResult<Plan> {
    tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(
            0,
            InferenceFact::dt_shape(f32::datum_type(), input_shape.to_vec()),
        )?
        .into_optimized()?
        .into_runnable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_selects_output() {
        // classifier.onnx: Relu(features) and Softmax(features) over [1, 3]
        let model = OnnxModel::load(crate::fixture("classifier.onnx"), &[1, 3]).unwrap();

        let relu = model.run(&[-1.0, 2.0, 3.0], 0).unwrap();
        assert_eq!(relu.shape, vec![1, 3]);
        assert_eq!(relu.data, vec![0.0, 2.0, 3.0]);

        let softmax = model.run(&[-1.0, 2.0, 3.0], 1).unwrap();
        assert_eq!(softmax.shape, vec![1, 3]);
        assert!((softmax.data.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_run_rejects_bad_input_and_output() {
        let model = OnnxModel::load(crate::fixture("classifier.onnx"), &[1, 3]).unwrap();

        assert!(matches!(
            model.run(&[1.0, 2.0], 0),
            Err(InferenceError::InvalidInputShape { .. })
        ));
        match model.run(&[1.0, 2.0, 3.0], 2) {
            Err(InferenceError::InferenceFailed(msg)) => assert!(msg.contains("2 outputs")),
            other => panic!("expected missing output, got {:?}", other.map(|o| o.shape)),
        }
    }

    #[test]
    fn test_missing_model_file() {
        let result = OnnxModel::load("does/not/exist.onnx", &[1, 7]);
        match result {
            Err(InferenceError::ModelLoadError(msg)) => assert!(msg.contains("exist.onnx")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("missing model should not load"),
        }
    }

    #[test]
    fn test_corrupt_model_file() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"definitely not protobuf").unwrap();

        let result = OnnxModel::load(file.path(), &[1, 3]);
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
