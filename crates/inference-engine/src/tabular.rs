//! Tabular models: probabilistic classifiers and scalar regressors

use crate::engine::OnnxModel;
use crate::InferenceError;
use std::path::Path;

/// Multi-class classifier producing one probability per class.
///
/// Probabilities are returned in the classifier's native class order; index
/// `i` is class id `i`.
pub trait Classifier: Send + Sync {
    /// Class probabilities for a single feature row
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError>;
}

/// Regressor producing a single scalar
pub trait Regressor: Send + Sync {
    /// Predicted value for a single feature row
    fn predict(&self, features: &[f32]) -> Result<f64, InferenceError>;
}

/// Classifier backed by an ONNX graph with a `[1, n_features]` input.
///
/// Converted scikit-learn classifiers emit the label first and the
/// probability tensor second, hence the configurable output index.
pub struct OnnxClassifier {
    model: OnnxModel,
    probabilities_output: usize,
}

impl OnnxClassifier {
    pub fn load(
        path: impl AsRef<Path>,
        n_features: usize,
        probabilities_output: usize,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            model: OnnxModel::load(path, &[1, n_features])?,
            probabilities_output,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let output = self.model.run(features, self.probabilities_output)?;
        match output.shape.as_slice() {
            [_] | [1, _] => Ok(output.data),
            other => Err(InferenceError::InvalidInputShape {
                expected: "[1, classes] probability output".to_string(),
                actual: format!("{:?}", other),
            }),
        }
    }
}

/// Regressor backed by an ONNX graph with a `[1, n_features]` input
pub struct OnnxRegressor {
    model: OnnxModel,
    output: usize,
}

impl OnnxRegressor {
    pub fn load(path: impl AsRef<Path>, n_features: usize, output: usize) -> Result<Self, InferenceError> {
        Ok(Self {
            model: OnnxModel::load(path, &[1, n_features])?,
            output,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, features: &[f32]) -> Result<f64, InferenceError> {
        let output = self.model.run(features, self.output)?;
        output
            .data
            .first()
            .map(|v| f64::from(*v))
            .ok_or_else(|| InferenceError::InferenceFailed("regressor produced no output".to_string()))
    }
}
