//! Request Validator

use crate::error::ValidationError;
use crate::request::{FieldValue, PredictionRequest, UploadedFile};
use crate::schema::{FieldKind, FieldSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accept numeric fields sent as strings ("80"), as HTML forms do
    pub accept_numeric_strings: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            accept_numeric_strings: true,
        }
    }
}

/// Request fields extracted in schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    /// Numeric fields, in the order the schema declares them
    pub numbers: Vec<f64>,
    /// Text fields, in schema order
    pub texts: Vec<String>,
    /// The file field, if the schema declares one
    pub file: Option<UploadedFile>,
}

impl ValidatedInput {
    /// Numeric fields as a model feature row
    pub fn features(&self) -> Vec<f32> {
        self.numbers.iter().map(|v| *v as f32).collect()
    }
}

/// Validator for prediction requests
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Check `request` against `schema`.
    ///
    /// Fields are checked in declared order and the first problem is
    /// reported. Extra fields are ignored.
    pub fn validate(
        &self,
        schema: &[FieldSpec],
        request: &PredictionRequest,
    ) -> Result<ValidatedInput, ValidationError> {
        let mut input = ValidatedInput::default();

        for spec in schema {
            let value = request.get(spec.name);
            match spec.kind {
                FieldKind::Numeric => input.numbers.push(self.numeric(spec, value)?),
                FieldKind::Text => input.texts.push(self.text(spec, value)?),
                FieldKind::File => input.file = Some(self.file(spec, value)?),
            }
        }

        debug!("Validated {} fields", schema.len());
        Ok(input)
    }

    fn numeric(&self, spec: &FieldSpec, value: Option<&FieldValue>) -> Result<f64, ValidationError> {
        let number = match value {
            None | Some(FieldValue::Null) => return Err(ValidationError::MissingField(spec.name)),
            Some(FieldValue::Number(n)) => Some(*n),
            Some(FieldValue::Text(s)) if self.config.accept_numeric_strings => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        number
            // Features reach the model as f32, so the value must survive the narrowing
            .filter(|n| n.is_finite() && (*n as f32).is_finite())
            .ok_or(ValidationError::InvalidType {
                field: spec.name,
                expected: FieldKind::Numeric,
            })
    }

    fn text(&self, spec: &FieldSpec, value: Option<&FieldValue>) -> Result<String, ValidationError> {
        match value {
            None | Some(FieldValue::Null) => Err(ValidationError::MissingField(spec.name)),
            Some(FieldValue::Text(s)) if s.trim().is_empty() => Err(ValidationError::MissingField(spec.name)),
            Some(FieldValue::Text(s)) => Ok(s.clone()),
            Some(_) => Err(ValidationError::InvalidType {
                field: spec.name,
                expected: FieldKind::Text,
            }),
        }
    }

    fn file(&self, spec: &FieldSpec, value: Option<&FieldValue>) -> Result<UploadedFile, ValidationError> {
        match value {
            Some(FieldValue::File(file)) if file.size_bytes > 0 => Ok(file.clone()),
            Some(FieldValue::File(_)) | None | Some(FieldValue::Null) => {
                Err(ValidationError::MissingFile(spec.name))
            }
            Some(_) => Err(ValidationError::InvalidType {
                field: spec.name,
                expected: FieldKind::File,
            }),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
