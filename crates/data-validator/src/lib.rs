//! Request Validation
//!
//! Checks that a prediction request carries every field its route declares,
//! with the right primitive kind, before any model is invoked.

mod error;
mod request;
mod schema;
mod validator;

pub use error::ValidationError;
pub use request::{FieldValue, PredictionRequest, UploadedFile};
pub use schema::{FieldKind, FieldSpec};
pub use validator::{ValidatedInput, ValidationConfig, Validator};
