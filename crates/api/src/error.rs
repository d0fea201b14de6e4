//! Gateway errors and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use backends::BackendError;
use data_validator::ValidationError;
use intent_client::IntentError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Every way a gateway request can fail
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or mistyped field; covers the missing-input and invalid-type kinds
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Body could not be parsed at all
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    #[error("No route for {0}")]
    NotFound(String),
    /// Artifact failed to load at startup
    #[error("{0}")]
    ModelUnavailable(String),
    /// Backend raised during prediction
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
    /// External intent service unreachable or errored
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable error kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Validation(ValidationError::InvalidType { .. }) => "invalid_type",
            GatewayError::Validation(ValidationError::InvalidFormat(_)) => "bad_request",
            GatewayError::Validation(_) => "missing_input",
            GatewayError::BadRequest(_) => "bad_request",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::ModelUnavailable(_) => "model_unavailable",
            GatewayError::InferenceFailure(_) => "inference_failure",
            GatewayError::UpstreamFailure(_) => "upstream_failure",
            GatewayError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::ModelUnavailable(_)
            | GatewayError::InferenceFailure(_)
            | GatewayError::UpstreamFailure(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(e) => GatewayError::ModelUnavailable(e.to_string()),
            BackendError::Inference(msg) => GatewayError::InferenceFailure(msg),
        }
    }
}

impl From<IntentError> for GatewayError {
    fn from(err: IntentError) -> Self {
        GatewayError::UpstreamFailure(err.to_string())
    }
}

/// Error body returned on every failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} ({})", self, self.kind());
        } else {
            warn!("{} ({})", self, self.kind());
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_store::ArtifactError;
    use data_validator::FieldKind;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GatewayError::from(ValidationError::MissingField("ph")), 400, "missing_input"),
            (GatewayError::from(ValidationError::MissingFile("image")), 400, "missing_input"),
            (
                GatewayError::from(ValidationError::InvalidType {
                    field: "ph",
                    expected: FieldKind::Numeric,
                }),
                400,
                "invalid_type",
            ),
            (GatewayError::BadRequest("eof".into()), 400, "bad_request"),
            (GatewayError::NotFound("/x".into()), 404, "not_found"),
            (
                GatewayError::from(BackendError::Unavailable(ArtifactError::Unavailable {
                    name: "crop_model".into(),
                    reason: "missing".into(),
                })),
                500,
                "model_unavailable",
            ),
            (GatewayError::from(BackendError::Inference("boom".into())), 500, "inference_failure"),
            (GatewayError::from(IntentError::Timeout(10)), 500, "upstream_failure"),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.status().as_u16(), status, "{}", err);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_messages_surface_cause() {
        let err = GatewayError::from(BackendError::Unavailable(ArtifactError::Unavailable {
            name: "crop_model".into(),
            reason: "file not found".into(),
        }));
        assert_eq!(err.to_string(), "Model unavailable: crop_model (file not found)");

        let err = GatewayError::from(ValidationError::MissingFile("image"));
        assert_eq!(err.to_string(), "No image uploaded");
    }
}
