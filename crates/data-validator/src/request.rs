//! Prediction request payloads

use crate::error::ValidationError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// A file received with the request and already written to scoped storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Sanitized client-supplied name
    pub filename: String,
    /// Location of the stored bytes
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Value of one request field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    File(UploadedFile),
    /// Arrays, objects and anything else without a scalar reading
    Other,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Other, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(_) | Value::Object(_) => FieldValue::Other,
        }
    }
}

/// Named fields of one prediction call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRequest {
    fields: HashMap<String, FieldValue>,
}

impl PredictionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from a JSON body, which must be an object
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        match body {
            Value::Object(map) => Ok(Self {
                fields: map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect(),
            }),
            other => Err(ValidationError::InvalidFormat(format!(
                "request body must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let request = PredictionRequest::from_json(json!({
            "humidity": 80,
            "pressure": "1012",
            "flags": [1, 2],
            "note": null,
        }))
        .unwrap();

        assert_eq!(request.len(), 4);
        assert_eq!(request.get("humidity"), Some(&FieldValue::Number(80.0)));
        assert_eq!(request.get("pressure"), Some(&FieldValue::Text("1012".into())));
        assert_eq!(request.get("flags"), Some(&FieldValue::Other));
        assert_eq!(request.get("note"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = PredictionRequest::from_json(json!([1, 2, 3])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFormat("request body must be a JSON object, got an array".into())
        );
    }
}
