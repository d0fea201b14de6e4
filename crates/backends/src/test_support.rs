//! Fake artifacts for adapter tests

use artifact_store::{Artifact, ArtifactStore, LabelEncoder};
use inference_engine::{Classifier, Detection, Detector, InferenceError, Regressor};
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Classifier returning fixed probabilities and counting calls
pub struct FixedClassifier {
    pub probs: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(probs: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            probs,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Classifier for FixedClassifier {
    fn predict_proba(&self, _features: &[f32]) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probs.clone())
    }
}

pub struct FixedRegressor(pub f64);

impl Regressor for FixedRegressor {
    fn predict(&self, _features: &[f32]) -> Result<f64, InferenceError> {
        Ok(self.0)
    }
}

pub struct FixedDetector(pub Vec<usize>);

impl Detector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        Ok(self
            .0
            .iter()
            .map(|class_id| Detection {
                class_id: *class_id,
                confidence: 0.9,
                bbox: [0.0, 0.0, 1.0, 1.0],
            })
            .collect())
    }
}

pub struct FailingRegressor;

impl Regressor for FailingRegressor {
    fn predict(&self, _features: &[f32]) -> Result<f64, InferenceError> {
        Err(InferenceError::InferenceFailed("graph exploded".into()))
    }
}

pub fn labels(names: &[&str]) -> Artifact {
    Artifact::Labels(Arc::new(
        LabelEncoder::new(names.iter().map(|s| s.to_string()).collect()).unwrap(),
    ))
}

pub fn store(entries: Vec<(&str, Artifact)>) -> Arc<ArtifactStore> {
    let mut store = ArtifactStore::new();
    for (name, artifact) in entries {
        store.insert(name, artifact);
    }
    Arc::new(store)
}
