//! Validation Error Types

use crate::schema::FieldKind;
use thiserror::Error;

/// Errors during request validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Required file upload absent or empty
    #[error("No {0} uploaded")]
    MissingFile(&'static str),

    /// Field present with the wrong kind of value
    #[error("Invalid type for field {field}: expected {expected}")]
    InvalidType {
        field: &'static str,
        expected: FieldKind,
    },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
