//! Agricultural Model-Serving Gateway
//!
//! HTTP front end for the crop, disease, weather and market backends and the
//! conversational intent service.

pub mod config;
pub mod error;
pub mod gateway;
pub mod upload;

mod routes;

pub use config::{load_config, GatewayConfig, LogFormat, ServerConfig};
pub use error::{ErrorBody, GatewayError};
pub use gateway::{Gateway, Route};
pub use upload::{sanitize_filename, ScopedUpload, UploadDir};

use anyhow::Context;
use artifact_store::ArtifactStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use data_validator::Validator;
use intent_client::{DialogflowClient, IntentClient};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
pub struct AppState {
    pub gateway: Gateway,
    pub uploads: UploadDir,
    /// Present when the Prometheus exporter is enabled
    pub metrics: Option<PrometheusHandle>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .route(Route::Crop.path(), post(routes::predict::crop))
        .route(Route::Disease.path(), post(routes::predict::disease))
        .route(Route::Weather.path(), post(routes::predict::weather))
        .route(Route::Market.path(), post(routes::predict::market))
        .route("/api/dialogflow", post(routes::dialogflow::converse))
        .route("/api/dialogflow/", post(routes::dialogflow::converse))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging; `RUST_LOG` overrides the default `info` filter
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Load every configured artifact and report the outcome
pub fn build_store(config: &GatewayConfig) -> ArtifactStore {
    let store = ArtifactStore::from_manifest(&config.models);
    for status in store.status() {
        match &status.error {
            None => info!("Artifact {} ready ({})", status.name, status.kind.unwrap_or("unknown")),
            Some(reason) => warn!("Artifact {} unavailable: {}", status.name, reason),
        }
    }
    store
}

fn build_intent_client(config: &GatewayConfig) -> Option<Arc<dyn IntentClient>> {
    let intent = config.intent.as_ref()?;
    match DialogflowClient::new(intent.clone()) {
        Ok(client) => {
            info!("Intent service at {}", client.endpoint());
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Intent service disabled: {}", e);
            None
        }
    }
}

/// Build the state for `config`, loading artifacts from disk
pub fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let store = Arc::new(build_store(config));
    let gateway = Gateway::new(store, Duration::from_millis(config.server.inference_timeout_ms))
        .with_validator(Validator::new(config.validation.clone()))
        .with_intent(build_intent_client(config), config.canned_replies.clone());

    let metrics = if config.server.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    Ok(AppState {
        gateway,
        uploads: UploadDir::new(&config.server.upload_dir),
        metrics,
    })
}

/// Run the server until Ctrl-C
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    state
        .uploads
        .ensure()
        .await
        .with_context(|| format!("cannot create upload dir {}", state.uploads.root().display()))?;

    let app = create_router(Arc::new(state), config.server.max_upload_bytes);
    let addr = config.server.bind_addr();

    info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
