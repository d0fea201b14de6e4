//! HTTP handlers

pub mod dialogflow;
pub mod health;
pub mod predict;

use crate::error::GatewayError;
use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use axum::Json;
use data_validator::PredictionRequest;
use serde_json::Value;

/// Turn a parsed (or rejected) JSON body into a request
pub(crate) fn json_request(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<PredictionRequest, GatewayError> {
    let Json(value) = body.map_err(|rejection| GatewayError::BadRequest(rejection.body_text()))?;
    Ok(PredictionRequest::from_json(value)?)
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> GatewayError {
    GatewayError::NotFound(uri.path().to_string())
}
