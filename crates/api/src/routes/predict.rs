//! Prediction routes

use crate::error::GatewayError;
use crate::gateway::Route;
use crate::routes::json_request;
use crate::upload::ScopedUpload;
use crate::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use backends::PredictionOutput;
use data_validator::{FieldValue, PredictionRequest, ValidationError};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

type PredictionResult = Result<Json<PredictionOutput>, GatewayError>;

async fn predict_json(state: &AppState, route: Route, body: Result<Json<Value>, JsonRejection>) -> PredictionResult {
    let request = json_request(body)?;
    let output = state.gateway.dispatch(route, request).await?;
    Ok(Json(output))
}

pub async fn crop(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> PredictionResult {
    predict_json(&state, Route::Crop, body).await
}

pub async fn weather(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> PredictionResult {
    predict_json(&state, Route::Weather, body).await
}

pub async fn market(State(state): State<Arc<AppState>>, body: Result<Json<Value>, JsonRejection>) -> PredictionResult {
    predict_json(&state, Route::Market, body).await
}

/// Multipart image upload.
///
/// A body that is not multipart at all is treated like a request without an
/// image. Stored uploads live until this handler returns.
pub async fn disease(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> PredictionResult {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Rejected multipart body: {}", rejection.body_text());
        GatewayError::from(ValidationError::MissingFile("image"))
    })?;

    let mut request = PredictionRequest::new();
    let mut uploads: Vec<ScopedUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| GatewayError::BadRequest(e.body_text()))?;
                // An empty part is a form submitted without choosing a file
                if bytes.is_empty() {
                    continue;
                }
                let upload = state.uploads.persist(&file_name, &bytes).await?;
                request.insert(name, FieldValue::File(upload.file().clone()));
                uploads.push(upload);
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| GatewayError::BadRequest(e.body_text()))?;
                request.insert(name, FieldValue::Text(text));
            }
        }
    }

    let output = state.gateway.dispatch(Route::Disease, request).await;
    drop(uploads);
    Ok(Json(output?))
}
