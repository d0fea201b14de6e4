//! Chat route backed by the intent service

use crate::error::GatewayError;
use crate::routes::json_request;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use intent_client::IntentReply;
use serde_json::Value;
use std::sync::Arc;

pub async fn converse(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IntentReply>, GatewayError> {
    let request = json_request(body)?;
    let reply = state.gateway.converse(request).await?;
    Ok(Json(reply))
}
