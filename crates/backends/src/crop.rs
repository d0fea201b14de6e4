//! Crop recommendation

use crate::{Backend, BackendError, PredictionOutput};
use artifact_store::{names, ArtifactStore};
use data_validator::{FieldSpec, ValidatedInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Number of crops returned per recommendation
pub const TOP_K: usize = 3;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("N"),
    FieldSpec::numeric("P"),
    FieldSpec::numeric("K"),
    FieldSpec::numeric("temperature"),
    FieldSpec::numeric("humidity"),
    FieldSpec::numeric("ph"),
    FieldSpec::numeric("rainfall"),
];

/// Top crops with their probabilities, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crops: Vec<String>,
    pub probs: Vec<f32>,
}

/// Soil and climate to ranked crop list
pub struct CropBackend {
    store: Arc<ArtifactStore>,
}

impl CropBackend {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl Backend for CropBackend {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn predict(&self, input: &ValidatedInput) -> Result<PredictionOutput, BackendError> {
        let classifier = self.store.classifier(names::CROP_MODEL)?;
        let labels = self.store.labels(names::CROP_LABELS)?;

        let probs = clamp_probabilities(&classifier.predict_proba(&input.features())?)?;
        if probs.len() != labels.len() {
            return Err(BackendError::Inference(format!(
                "classifier produced {} probabilities but the label table has {} classes",
                probs.len(),
                labels.len()
            )));
        }

        let ranked = rank_top_k(&probs, TOP_K)?;
        let mut recommendation = CropRecommendation {
            crops: Vec::with_capacity(TOP_K),
            probs: Vec::with_capacity(TOP_K),
        };
        for class_id in ranked {
            let label = labels.decode(class_id).ok_or_else(|| {
                BackendError::Inference(format!("class id {} has no label", class_id))
            })?;
            recommendation.crops.push(label.to_string());
            recommendation.probs.push(probs[class_id]);
        }

        debug!("Crop recommendation: {:?}", recommendation.crops);
        Ok(PredictionOutput::Crop(recommendation))
    }
}

/// Float noise tolerated outside [0, 1] before a probability is rejected
const PROB_TOLERANCE: f32 = 1e-4;

/// Snap probabilities within [`PROB_TOLERANCE`] of [0, 1] onto the range.
///
/// NaN and values clearly outside the range are rejected.
fn clamp_probabilities(probs: &[f32]) -> Result<Vec<f32>, BackendError> {
    probs
        .iter()
        .map(|&p| {
            if p.is_nan() || p < -PROB_TOLERANCE || p > 1.0 + PROB_TOLERANCE {
                Err(BackendError::Inference(format!(
                    "classifier produced probability {} outside [0, 1]",
                    p
                )))
            } else {
                Ok(p.clamp(0.0, 1.0))
            }
        })
        .collect()
}

/// Indices of the `k` most probable classes, highest first.
///
/// The sort is stable: equal probabilities keep the classifier's class
/// order. Probabilities are clamped to [0, 1] before ranking.
pub fn rank_top_k(probs: &[f32], k: usize) -> Result<Vec<usize>, BackendError> {
    if probs.len() < k {
        return Err(BackendError::Inference(format!(
            "classifier produced {} classes, at least {} required",
            probs.len(),
            k
        )));
    }
    let probs = clamp_probabilities(probs)?;

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    order.truncate(k);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{labels, store, FixedClassifier};
    use artifact_store::Artifact;
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;

    fn input() -> ValidatedInput {
        ValidatedInput {
            numbers: vec![90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9],
            ..Default::default()
        }
    }

    #[test]
    fn test_top_three_with_labels() {
        let classifier = FixedClassifier::new(vec![0.05, 0.6, 0.1, 0.25]);
        let backend = CropBackend::new(store(vec![
            (names::CROP_MODEL, Artifact::Classifier(classifier.clone())),
            (names::CROP_LABELS, labels(&["apple", "rice", "maize", "jute"])),
        ]));

        let output = backend.predict(&input()).unwrap();
        assert_eq!(
            output,
            PredictionOutput::Crop(CropRecommendation {
                crops: vec!["rice".into(), "jute".into(), "maize".into()],
                probs: vec![0.6, 0.25, 0.1],
            })
        );
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_serializes_to_route_payload() {
        let output = PredictionOutput::Crop(CropRecommendation {
            crops: vec!["rice".into(), "jute".into(), "maize".into()],
            probs: vec![0.5, 0.25, 0.125],
        });
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            serde_json::json!({"crops": ["rice", "jute", "maize"], "probs": [0.5, 0.25, 0.125]})
        );
    }

    #[test]
    fn test_ties_keep_class_order() {
        assert_eq!(rank_top_k(&[0.2, 0.3, 0.2, 0.3], 3).unwrap(), vec![1, 3, 0]);
    }

    #[test]
    fn test_rejects_bad_probabilities() {
        assert!(rank_top_k(&[0.5, 0.5], 3).is_err());
        assert!(rank_top_k(&[0.5, 1.5, 0.1], 3).is_err());
        assert!(rank_top_k(&[0.5, -0.1, 0.1], 3).is_err());
        assert!(rank_top_k(&[0.5, f32::NAN, 0.1], 3).is_err());
    }

    #[test]
    fn test_float_noise_is_clamped() {
        assert_eq!(rank_top_k(&[1.0000001, 0.0, 0.0], 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(rank_top_k(&[-1e-7, 0.5, 0.5], 3).unwrap(), vec![1, 2, 0]);

        let backend = CropBackend::new(store(vec![
            (
                names::CROP_MODEL,
                Artifact::Classifier(FixedClassifier::new(vec![1.0000001, 0.0, 0.0, 0.0])),
            ),
            (names::CROP_LABELS, labels(&["apple", "rice", "maize", "jute"])),
        ]));
        assert_eq!(
            backend.predict(&input()).unwrap(),
            PredictionOutput::Crop(CropRecommendation {
                crops: vec!["apple".into(), "rice".into(), "maize".into()],
                probs: vec![1.0, 0.0, 0.0],
            })
        );
    }

    #[test]
    fn test_label_table_mismatch() {
        let backend = CropBackend::new(store(vec![
            (
                names::CROP_MODEL,
                Artifact::Classifier(FixedClassifier::new(vec![0.2, 0.3, 0.5])),
            ),
            (names::CROP_LABELS, labels(&["apple", "rice"])),
        ]));
        assert!(matches!(backend.predict(&input()), Err(BackendError::Inference(_))));
    }

    #[test]
    fn test_missing_artifact_is_unavailable() {
        let backend = CropBackend::new(store(vec![]));
        assert!(matches!(backend.predict(&input()), Err(BackendError::Unavailable(_))));
    }

    proptest! {
        #[test]
        fn ranking_is_sorted_and_stable(probs in prop::collection::vec(0.0f32..=1.0, 3..40)) {
            let ranked = rank_top_k(&probs, TOP_K).unwrap();
            prop_assert_eq!(ranked.len(), TOP_K);

            for pair in ranked.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(probs[a] >= probs[b]);
                if probs[a] == probs[b] {
                    prop_assert!(a < b);
                }
            }

            // Nothing left out beats the last pick
            let last = probs[ranked[TOP_K - 1]];
            for (i, p) in probs.iter().enumerate() {
                if !ranked.contains(&i) {
                    prop_assert!(*p <= last);
                }
            }
        }
    }
}
