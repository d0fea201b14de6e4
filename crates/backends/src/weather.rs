//! Weather prediction

use crate::{Backend, BackendError, PredictionOutput};
use artifact_store::{names, ArtifactStore};
use data_validator::{FieldSpec, ValidatedInput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("humidity"),
    FieldSpec::numeric("pressure"),
    FieldSpec::numeric("temperature"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub predicted_weather: String,
}

/// Humidity, pressure and temperature to a weather category
pub struct WeatherBackend {
    store: Arc<ArtifactStore>,
}

impl WeatherBackend {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl Backend for WeatherBackend {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn predict(&self, input: &ValidatedInput) -> Result<PredictionOutput, BackendError> {
        let classifier = self.store.classifier(names::WEATHER_MODEL)?;
        let labels = self.store.labels(names::WEATHER_LABELS)?;

        let probs = classifier.predict_proba(&input.features())?;
        let class_id = argmax(&probs)
            .ok_or_else(|| BackendError::Inference("classifier produced no scores".to_string()))?;
        let label = labels.decode(class_id).ok_or_else(|| {
            BackendError::Inference(format!("class id {} has no label", class_id))
        })?;

        Ok(PredictionOutput::Weather(WeatherForecast {
            predicted_weather: label.to_string(),
        }))
    }
}

/// Index of the highest score; the first one wins ties. NaN never wins.
fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, score) in scores.iter().copied().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{labels, store, FixedClassifier};
    use artifact_store::Artifact;

    fn scenario() -> ValidatedInput {
        ValidatedInput {
            numbers: vec![80.0, 1012.0, 25.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_predicts_category() {
        let backend = WeatherBackend::new(store(vec![
            (
                names::WEATHER_MODEL,
                Artifact::Classifier(FixedClassifier::new(vec![0.1, 0.7, 0.2])),
            ),
            (names::WEATHER_LABELS, labels(&["Sunny", "Rainy", "Cloudy"])),
        ]));

        let output = backend.predict(&scenario()).unwrap();
        assert_eq!(
            output,
            PredictionOutput::Weather(WeatherForecast {
                predicted_weather: "Rainy".into()
            })
        );
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), Some(1));
        assert_eq!(argmax(&[f32::NAN, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_unavailable_model() {
        let mut store = artifact_store::ArtifactStore::new();
        store.insert_failure(names::WEATHER_MODEL, "file not found");
        let backend = WeatherBackend::new(Arc::new(store));

        match backend.predict(&scenario()) {
            Err(BackendError::Unavailable(e)) => assert!(e.to_string().contains("file not found")),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }
}
