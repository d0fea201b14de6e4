//! Liveness and metrics

use crate::error::GatewayError;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness check; answers even when artifacts failed to load
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ML service running fine",
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, GatewayError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| GatewayError::NotFound("/metrics".to_string()))
}
