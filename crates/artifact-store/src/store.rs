//! Artifact Store Implementation

use crate::labels::LabelEncoder;
use crate::manifest::ArtifactManifest;
use crate::ArtifactError;
use inference_engine::{Classifier, Detector, Regressor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A deserialized, immutable model artifact
#[derive(Clone)]
pub enum Artifact {
    Classifier(Arc<dyn Classifier>),
    Regressor(Arc<dyn Regressor>),
    Detector(Arc<dyn Detector>),
    Labels(Arc<LabelEncoder>),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Classifier(_) => "classifier",
            Artifact::Regressor(_) => "regressor",
            Artifact::Detector(_) => "detector",
            Artifact::Labels(_) => "labels",
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Labels(labels) => f.debug_tuple("Labels").field(&labels.len()).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Load outcome recorded for one artifact
enum Slot {
    Loaded(Artifact),
    Failed(String),
}

/// Load state of one artifact, for startup reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub name: String,
    pub kind: Option<&'static str>,
    pub error: Option<String>,
}

impl ArtifactStatus {
    pub fn is_loaded(&self) -> bool {
        self.error.is_none()
    }
}

/// Process-lifetime artifact store.
///
/// Each name is loaded at most once. A failed load is remembered and every
/// later lookup for that name fails with [`ArtifactError::Unavailable`];
/// nothing is retried or reloaded.
#[derive(Default)]
pub struct ArtifactStore {
    slots: HashMap<String, Slot>,
}

impl ArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every artifact named in the manifest.
    ///
    /// Failures are recorded, never fatal: the process keeps serving the
    /// routes whose artifacts did load.
    pub fn from_manifest(manifest: &ArtifactManifest) -> Self {
        info!("Loading {} artifacts", manifest.artifacts.len());
        let mut store = Self::new();
        for (name, spec) in &manifest.artifacts {
            let _ = store.load(name, || spec.load());
        }
        store
    }

    /// Run `loader` for `name` and record the outcome.
    ///
    /// A name that already has an outcome is left untouched and the loader
    /// is not called.
    pub fn load<F>(&mut self, name: &str, loader: F) -> Result<Artifact, ArtifactError>
    where
        F: FnOnce() -> Result<Artifact, ArtifactError>,
    {
        if self.slots.contains_key(name) {
            warn!("Artifact {} already loaded; ignoring reload", name);
            return self.get(name);
        }

        match loader() {
            Ok(artifact) => {
                info!("Artifact {} loaded ({})", name, artifact.kind());
                self.slots.insert(name.to_string(), Slot::Loaded(artifact.clone()));
                Ok(artifact)
            }
            Err(e) => {
                error!("Artifact {} failed to load: {}", name, e);
                self.slots.insert(name.to_string(), Slot::Failed(e.to_string()));
                Err(self.unavailable(name, e.to_string()))
            }
        }
    }

    /// Record an already constructed artifact
    pub fn insert(&mut self, name: &str, artifact: Artifact) {
        self.slots.insert(name.to_string(), Slot::Loaded(artifact));
    }

    /// Record a load failure without running a loader
    pub fn insert_failure(&mut self, name: &str, reason: impl Into<String>) {
        self.slots.insert(name.to_string(), Slot::Failed(reason.into()));
    }

    /// Look up an artifact. Returns the same shared object on every call.
    pub fn get(&self, name: &str) -> Result<Artifact, ArtifactError> {
        match self.slots.get(name) {
            Some(Slot::Loaded(artifact)) => Ok(artifact.clone()),
            Some(Slot::Failed(reason)) => Err(self.unavailable(name, reason.clone())),
            None => Err(self.unavailable(name, "not loaded".to_string())),
        }
    }

    pub fn classifier(&self, name: &str) -> Result<Arc<dyn Classifier>, ArtifactError> {
        match self.get(name)? {
            Artifact::Classifier(model) => Ok(model),
            other => Err(self.wrong_kind(name, "classifier", &other)),
        }
    }

    pub fn regressor(&self, name: &str) -> Result<Arc<dyn Regressor>, ArtifactError> {
        match self.get(name)? {
            Artifact::Regressor(model) => Ok(model),
            other => Err(self.wrong_kind(name, "regressor", &other)),
        }
    }

    pub fn detector(&self, name: &str) -> Result<Arc<dyn Detector>, ArtifactError> {
        match self.get(name)? {
            Artifact::Detector(model) => Ok(model),
            other => Err(self.wrong_kind(name, "detector", &other)),
        }
    }

    pub fn labels(&self, name: &str) -> Result<Arc<LabelEncoder>, ArtifactError> {
        match self.get(name)? {
            Artifact::Labels(labels) => Ok(labels),
            other => Err(self.wrong_kind(name, "labels", &other)),
        }
    }

    /// Load state of every recorded artifact, sorted by name
    pub fn status(&self) -> Vec<ArtifactStatus> {
        let mut status: Vec<_> = self
            .slots
            .iter()
            .map(|(name, slot)| match slot {
                Slot::Loaded(artifact) => ArtifactStatus {
                    name: name.clone(),
                    kind: Some(artifact.kind()),
                    error: None,
                },
                Slot::Failed(reason) => ArtifactStatus {
                    name: name.clone(),
                    kind: None,
                    error: Some(reason.clone()),
                },
            })
            .collect();
        status.sort_by(|a, b| a.name.cmp(&b.name));
        status
    }

    fn unavailable(&self, name: &str, reason: String) -> ArtifactError {
        ArtifactError::Unavailable {
            name: name.to_string(),
            reason,
        }
    }

    fn wrong_kind(&self, name: &str, expected: &str, found: &Artifact) -> ArtifactError {
        self.unavailable(
            name,
            format!("expected a {} artifact, found {}", expected, found.kind()),
        )
    }
}
