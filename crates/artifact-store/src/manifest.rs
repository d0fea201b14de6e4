//! Artifact manifest: where each artifact lives and how to load it

use crate::labels::LabelEncoder;
use crate::names;
use crate::store::Artifact;
use crate::ArtifactError;
use inference_engine::{OnnxClassifier, OnnxDetector, OnnxRegressor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// How to load one artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSpec {
    /// Probabilistic classifier with a `[1, features]` input.
    ///
    /// The default `probabilities_output: 1` matches scikit-learn graphs
    /// converted by sklearn-onnx with `zipmap=False`: output 0 is the label,
    /// output 1 a float `[1, classes]` tensor. The default ZipMap export emits
    /// a sequence of maps instead, which cannot be read as probabilities;
    /// re-export with `options={"zipmap": False}`.
    Classifier {
        path: PathBuf,
        features: usize,
        /// Index of the float probability tensor among the graph outputs
        #[serde(default = "default_probabilities_output")]
        probabilities_output: usize,
    },
    /// Scalar regressor with a `[1, features]` input
    Regressor {
        path: PathBuf,
        features: usize,
        #[serde(default)]
        output: usize,
    },
    /// YOLO-style object detector
    Detector {
        path: PathBuf,
        #[serde(default = "default_input_size")]
        input_size: u32,
        #[serde(default = "default_confidence_threshold")]
        confidence_threshold: f32,
    },
    /// JSON label table
    Labels { path: PathBuf },
}

fn default_probabilities_output() -> usize {
    1
}

fn default_input_size() -> u32 {
    640
}

fn default_confidence_threshold() -> f32 {
    0.25
}

impl ArtifactSpec {
    /// Deserialize the artifact from disk
    pub fn load(&self) -> Result<Artifact, ArtifactError> {
        let artifact = match self {
            ArtifactSpec::Classifier {
                path,
                features,
                probabilities_output,
            } => Artifact::Classifier(Arc::new(OnnxClassifier::load(
                path,
                *features,
                *probabilities_output,
            )?)),
            ArtifactSpec::Regressor { path, features, output } => {
                Artifact::Regressor(Arc::new(OnnxRegressor::load(path, *features, *output)?))
            }
            ArtifactSpec::Detector {
                path,
                input_size,
                confidence_threshold,
            } => Artifact::Detector(Arc::new(OnnxDetector::load(
                path,
                *input_size,
                *confidence_threshold,
            )?)),
            ArtifactSpec::Labels { path } => Artifact::Labels(Arc::new(LabelEncoder::load(path)?)),
        };
        Ok(artifact)
    }

    /// Kind name, matching the serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            ArtifactSpec::Classifier { .. } => "classifier",
            ArtifactSpec::Regressor { .. } => "regressor",
            ArtifactSpec::Detector { .. } => "detector",
            ArtifactSpec::Labels { .. } => "labels",
        }
    }
}

/// Named artifact specs loaded at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub artifacts: BTreeMap<String, ArtifactSpec>,
}

impl Default for ArtifactManifest {
    fn default() -> Self {
        let mut artifacts = BTreeMap::new();
        artifacts.insert(
            names::CROP_MODEL.to_string(),
            ArtifactSpec::Classifier {
                path: PathBuf::from("models/crop_recommendation_model.onnx"),
                features: 7,
                probabilities_output: default_probabilities_output(),
            },
        );
        artifacts.insert(
            names::CROP_LABELS.to_string(),
            ArtifactSpec::Labels {
                path: PathBuf::from("models/label_encoder.json"),
            },
        );
        artifacts.insert(
            names::DISEASE_MODEL.to_string(),
            ArtifactSpec::Detector {
                path: PathBuf::from("models/disease_model.onnx"),
                input_size: default_input_size(),
                confidence_threshold: default_confidence_threshold(),
            },
        );
        artifacts.insert(
            names::DISEASE_LABELS.to_string(),
            ArtifactSpec::Labels {
                path: PathBuf::from("models/disease_labels.json"),
            },
        );
        artifacts.insert(
            names::WEATHER_MODEL.to_string(),
            ArtifactSpec::Classifier {
                path: PathBuf::from("models/weather_model.onnx"),
                features: 3,
                probabilities_output: default_probabilities_output(),
            },
        );
        artifacts.insert(
            names::WEATHER_LABELS.to_string(),
            ArtifactSpec::Labels {
                path: PathBuf::from("models/weather_labels.json"),
            },
        );
        artifacts.insert(
            names::MARKET_MODEL.to_string(),
            ArtifactSpec::Regressor {
                path: PathBuf::from("models/market_model.onnx"),
                features: 3,
                output: 0,
            },
        );
        Self { artifacts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_manifest_covers_every_backend() {
        let manifest = ArtifactManifest::default();
        for name in [
            names::CROP_MODEL,
            names::CROP_LABELS,
            names::DISEASE_MODEL,
            names::DISEASE_LABELS,
            names::WEATHER_MODEL,
            names::WEATHER_LABELS,
            names::MARKET_MODEL,
        ] {
            assert!(manifest.artifacts.contains_key(name), "missing {}", name);
        }
        assert_eq!(manifest.artifacts[names::MARKET_MODEL].kind(), "regressor");
    }

    #[test]
    fn test_spec_defaults_from_json() {
        let spec: ArtifactSpec =
            serde_json::from_str(r#"{"kind": "detector", "path": "models/yolo.onnx"}"#).unwrap();
        assert_eq!(
            spec,
            ArtifactSpec::Detector {
                path: PathBuf::from("models/yolo.onnx"),
                input_size: 640,
                confidence_threshold: 0.25,
            }
        );
    }

    #[test]
    fn test_classifier_defaults_to_second_output() {
        // Output 0 of the fixture is a non-probability tensor, output 1 a softmax row
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../inference-engine/testdata/classifier.onnx");
        let spec: ArtifactSpec = serde_json::from_value(serde_json::json!({
            "kind": "classifier",
            "path": path,
            "features": 3,
        }))
        .unwrap();

        let Artifact::Classifier(classifier) = spec.load().unwrap() else {
            panic!("expected a classifier");
        };
        let probs = classifier.predict_proba(&[-1.0, 2.0, 3.0]).unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let spec = ArtifactSpec::Labels {
            path: PathBuf::from("nowhere/labels.json"),
        };
        assert!(matches!(spec.load(), Err(ArtifactError::Load(_))));
    }
}
