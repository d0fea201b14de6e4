//! Dialogflow ES detect-intent client

use crate::{IntentClient, IntentError, IntentReply, FALLBACK_REPLY};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Dialogflow connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogflowConfig {
    /// API root, without the `/v2` suffix
    pub base_url: String,
    /// Agent project id
    pub project_id: String,
    /// Session path segment
    pub session_id: String,
    /// Query language
    pub language_code: String,
    /// OAuth bearer token, if the endpoint needs one
    pub access_token: Option<String>,
    /// Request timeout (ms)
    pub timeout_ms: u64,
}

impl Default for DialogflowConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dialogflow.googleapis.com".to_string(),
            project_id: String::new(),
            session_id: "local-session".to_string(),
            language_code: "en".to_string(),
            access_token: None,
            timeout_ms: 10_000,
        }
    }
}

/// Detect-intent response, reduced to the fields the gateway reads
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    #[serde(default)]
    query_result: QueryResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    fulfillment_text: String,
    #[serde(default)]
    intent: Option<Intent>,
    #[serde(default)]
    intent_detection_confidence: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Intent {
    #[serde(default)]
    display_name: String,
}

impl From<DetectIntentResponse> for IntentReply {
    fn from(response: DetectIntentResponse) -> Self {
        let result = response.query_result;
        let reply = if result.fulfillment_text.trim().is_empty() {
            FALLBACK_REPLY.to_string()
        } else {
            result.fulfillment_text
        };
        IntentReply {
            reply,
            intent: result.intent.map(|i| i.display_name).unwrap_or_default(),
            confidence: result.intent_detection_confidence,
        }
    }
}

/// HTTP client for the Dialogflow v2 `detectIntent` endpoint
pub struct DialogflowClient {
    http: reqwest::Client,
    endpoint: String,
    config: DialogflowConfig,
}

impl DialogflowClient {
    pub fn new(config: DialogflowConfig) -> Result<Self, IntentError> {
        if config.project_id.trim().is_empty() {
            return Err(IntentError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| IntentError::Transport(e.to_string()))?;
        let endpoint = format!(
            "{}/v2/projects/{}/agent/sessions/{}:detectIntent",
            config.base_url.trim_end_matches('/'),
            path_segment("project_id", &config.project_id)?,
            path_segment("session_id", &config.session_id)?
        );

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Percent-encode an id for use as one URL path segment
fn path_segment(name: &str, value: &str) -> Result<String, IntentError> {
    match value.trim() {
        "" | "." | ".." => Err(IntentError::InvalidConfig(format!(
            "{} '{}' is not a valid path segment",
            name, value
        ))),
        _ => Ok(urlencoding::encode(value).into_owned()),
    }
}

#[async_trait]
impl IntentClient for DialogflowClient {
    async fn detect_intent(&self, message: &str) -> Result<IntentReply, IntentError> {
        let body = json!({
            "queryInput": {
                "text": {
                    "text": message,
                    "languageCode": self.config.language_code,
                }
            }
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                IntentError::Timeout(self.config.timeout_ms)
            } else {
                IntentError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Intent service returned {}", status);
            return Err(IntentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: DetectIntentResponse = response
            .json()
            .await
            .map_err(|e| IntentError::Malformed(e.to_string()))?;
        let reply = IntentReply::from(parsed);
        debug!("Detected intent '{}' ({:.2})", reply.intent, reply.confidence);
        Ok(reply)
    }
}
