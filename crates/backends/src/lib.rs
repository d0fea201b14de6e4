//! Prediction Backends
//!
//! One adapter per model type. Each declares the fields it needs, turns a
//! validated request into the model's input and normalizes the raw output
//! into a domain result.

pub mod crop;
pub mod disease;
pub mod market;
pub mod weather;

pub use crop::{rank_top_k, CropBackend, CropRecommendation};
pub use disease::{DiseaseBackend, DiseaseReport};
pub use market::{MarketBackend, MarketPrice};
pub use weather::{WeatherBackend, WeatherForecast};

use artifact_store::ArtifactError;
use data_validator::{FieldSpec, ValidatedInput};
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Unavailable(#[from] ArtifactError),
    #[error("{0}")]
    Inference(String),
}

impl From<InferenceError> for BackendError {
    fn from(err: InferenceError) -> Self {
        BackendError::Inference(err.to_string())
    }
}

/// Successful prediction of any backend, serialized as the route's payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Crop(CropRecommendation),
    Disease(DiseaseReport),
    Weather(WeatherForecast),
    Market(MarketPrice),
}

/// A prediction capability behind one route.
///
/// Implementations only read their artifacts, so one instance serves
/// concurrent requests.
pub trait Backend: Send + Sync {
    /// Short name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Fields the request must carry
    fn schema(&self) -> &'static [FieldSpec];

    /// Run inference on an already validated request
    fn predict(&self, input: &ValidatedInput) -> Result<PredictionOutput, BackendError>;
}

#[cfg(test)]
mod test_support;
