//! Conversational Intent Client
//!
//! Forwards free text to an external intent-recognition service and gets back
//! a reply, the matched intent and its confidence. The service is a black
//! box; only its request/response contract lives here.

mod canned;
mod dialogflow;

pub use canned::CannedReplies;
pub use dialogflow::{DialogflowClient, DialogflowConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply used when the service matched nothing it could answer
pub const FALLBACK_REPLY: &str = "I didn't catch that. Could you rephrase?";

/// Intent service error types
#[derive(Error, Debug)]
pub enum IntentError {
    #[error("Intent service request failed: {0}")]
    Transport(String),

    #[error("Intent service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Intent service timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed intent response: {0}")]
    Malformed(String),

    #[error("Intent service not configured")]
    NotConfigured,

    #[error("Invalid intent service config: {0}")]
    InvalidConfig(String),
}

/// Result of one intent detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentReply {
    pub reply: String,
    pub intent: String,
    pub confidence: f32,
}

/// An intent-recognition service
#[async_trait]
pub trait IntentClient: Send + Sync {
    /// Classify a free-text message
    async fn detect_intent(&self, message: &str) -> Result<IntentReply, IntentError>;
}
