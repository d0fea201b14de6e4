//! Plant disease detection

use crate::{Backend, BackendError, PredictionOutput};
use artifact_store::{names, ArtifactStore};
use data_validator::{FieldSpec, ValidatedInput};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

const FIELDS: &[FieldSpec] = &[FieldSpec::file("image")];

/// Distinct disease labels found in one image, sorted by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseReport {
    pub detected_diseases: Vec<String>,
}

/// Leaf image to the set of detected diseases
pub struct DiseaseBackend {
    store: Arc<ArtifactStore>,
}

impl DiseaseBackend {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }
}

impl Backend for DiseaseBackend {
    fn name(&self) -> &'static str {
        "disease"
    }

    fn schema(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn predict(&self, input: &ValidatedInput) -> Result<PredictionOutput, BackendError> {
        let upload = input
            .file
            .as_ref()
            .ok_or_else(|| BackendError::Inference("no image in request".to_string()))?;

        let detector = self.store.detector(names::DISEASE_MODEL)?;
        let labels = self.store.labels(names::DISEASE_LABELS)?;

        let image = ImageReader::open(&upload.path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| BackendError::Inference(format!("cannot read {}: {}", upload.filename, e)))?
            .decode()
            .map_err(|e| BackendError::Inference(format!("cannot decode {}: {}", upload.filename, e)))?;

        let detections = detector.detect(&image)?;
        let mut diseases = BTreeSet::new();
        for detection in &detections {
            let label = labels.decode(detection.class_id).ok_or_else(|| {
                BackendError::Inference(format!("class id {} has no label", detection.class_id))
            })?;
            diseases.insert(label.to_string());
        }

        debug!(
            "{} boxes in {} -> {} diseases",
            detections.len(),
            upload.filename,
            diseases.len()
        );
        Ok(PredictionOutput::Disease(DiseaseReport {
            detected_diseases: diseases.into_iter().collect(),
        }))
    }
}
