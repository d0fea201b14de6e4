//! Request dispatcher
//!
//! Maps a route to its backend, validates the request against the backend's
//! schema, runs inference off the async runtime and shapes the outcome.

use crate::error::GatewayError;
use artifact_store::ArtifactStore;
use backends::{Backend, CropBackend, DiseaseBackend, MarketBackend, PredictionOutput, WeatherBackend};
use data_validator::{FieldSpec, PredictionRequest, Validator};
use inference_engine::InferenceError;
use intent_client::{CannedReplies, IntentClient, IntentError, IntentReply};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const MESSAGE_FIELDS: &[FieldSpec] = &[FieldSpec::text("message")];

/// Prediction routes served by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Crop,
    Disease,
    Weather,
    Market,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Crop => "crop",
            Route::Disease => "disease",
            Route::Weather => "weather",
            Route::Market => "market",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Crop => "/predict/crop",
            Route::Disease => "/predict/disease",
            Route::Weather => "/predict/weather",
            Route::Market => "/predict/market",
        }
    }
}

/// The model-serving gateway.
///
/// Holds no mutable state: backends share read-only artifacts, so concurrent
/// dispatches never coordinate.
pub struct Gateway {
    backends: HashMap<Route, Arc<dyn Backend>>,
    validator: Validator,
    inference_timeout: Duration,
    intent: Option<Arc<dyn IntentClient>>,
    canned: CannedReplies,
}

impl Gateway {
    /// Gateway with the four standard backends over `store`
    pub fn new(store: Arc<ArtifactStore>, inference_timeout: Duration) -> Self {
        Self::empty(inference_timeout)
            .with_backend(Route::Crop, Arc::new(CropBackend::new(store.clone())))
            .with_backend(Route::Disease, Arc::new(DiseaseBackend::new(store.clone())))
            .with_backend(Route::Weather, Arc::new(WeatherBackend::new(store.clone())))
            .with_backend(Route::Market, Arc::new(MarketBackend::new(store)))
    }

    /// Gateway with no backends registered
    pub fn empty(inference_timeout: Duration) -> Self {
        Self {
            backends: HashMap::new(),
            validator: Validator::default(),
            inference_timeout,
            intent: None,
            canned: CannedReplies::default(),
        }
    }

    /// Register or replace the backend for a route
    pub fn with_backend(mut self, route: Route, backend: Arc<dyn Backend>) -> Self {
        debug!("Registering {} backend on {}", backend.name(), route.path());
        self.backends.insert(route, backend);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Attach the external intent service and its canned-reply table
    pub fn with_intent(mut self, client: Option<Arc<dyn IntentClient>>, canned: CannedReplies) -> Self {
        self.intent = client;
        self.canned = canned;
        self
    }

    /// Validate, predict and shape one request
    pub async fn dispatch(
        &self,
        route: Route,
        request: PredictionRequest,
    ) -> Result<PredictionOutput, GatewayError> {
        let start = Instant::now();
        let outcome = self.run(route, request).await;
        record(route.as_str(), &outcome, start);
        outcome
    }

    async fn run(&self, route: Route, request: PredictionRequest) -> Result<PredictionOutput, GatewayError> {
        let backend = self
            .backends
            .get(&route)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(route.path().to_string()))?;

        let input = self.validator.validate(backend.schema(), &request)?;

        let task = tokio::task::spawn_blocking(move || backend.predict(&input));
        match tokio::time::timeout(self.inference_timeout, task).await {
            Ok(Ok(result)) => result.map_err(GatewayError::from),
            Ok(Err(join_error)) => Err(GatewayError::InferenceFailure(format!(
                "inference task aborted: {}",
                join_error
            ))),
            Err(_) => Err(GatewayError::InferenceFailure(
                InferenceError::Timeout(self.inference_timeout.as_millis() as u64).to_string(),
            )),
        }
    }

    /// Forward a chat message to the intent service
    pub async fn converse(&self, request: PredictionRequest) -> Result<IntentReply, GatewayError> {
        let start = Instant::now();
        let outcome = self.run_converse(request).await;
        record("dialogflow", &outcome, start);
        outcome
    }

    async fn run_converse(&self, request: PredictionRequest) -> Result<IntentReply, GatewayError> {
        let input = self.validator.validate(MESSAGE_FIELDS, &request)?;
        let client = self.intent.as_ref().ok_or(IntentError::NotConfigured)?;

        let message = input.texts.concat();
        let reply = client.detect_intent(&message).await?;
        Ok(self.canned.apply(reply))
    }
}

/// Log and count one finished request
fn record<T>(route: &'static str, outcome: &Result<T, GatewayError>, start: Instant) {
    let elapsed = start.elapsed();
    let label = match outcome {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };

    metrics::counter!("gateway_requests_total", "route" => route, "outcome" => label).increment(1);
    metrics::histogram!("gateway_request_seconds", "route" => route).record(elapsed.as_secs_f64());
    info!("{} -> {} in {}ms", route, label, elapsed.as_millis());
}
