//! Artifact Store
//!
//! Holds every deserialized model artifact for the lifetime of the process.
//! Artifacts are loaded once at startup; lookups never touch the filesystem.

mod labels;
mod manifest;
mod store;

pub use labels::LabelEncoder;
pub use manifest::{ArtifactManifest, ArtifactSpec};
pub use store::{Artifact, ArtifactStatus, ArtifactStore};

use inference_engine::InferenceError;
use thiserror::Error;

/// Well-known artifact names used by the prediction backends
pub mod names {
    pub const CROP_MODEL: &str = "crop_model";
    pub const CROP_LABELS: &str = "crop_labels";
    pub const DISEASE_MODEL: &str = "disease_model";
    pub const DISEASE_LABELS: &str = "disease_labels";
    pub const WEATHER_MODEL: &str = "weather_model";
    pub const WEATHER_LABELS: &str = "weather_labels";
    pub const MARKET_MODEL: &str = "market_model";
}

/// Artifact errors
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    #[error("Model unavailable: {name} ({reason})")]
    Unavailable { name: String, reason: String },
    #[error("Artifact load failed: {0}")]
    Load(String),
    #[error("Invalid label table: {0}")]
    InvalidLabels(String),
}

impl From<InferenceError> for ArtifactError {
    fn from(err: InferenceError) -> Self {
        ArtifactError::Load(err.to_string())
    }
}
