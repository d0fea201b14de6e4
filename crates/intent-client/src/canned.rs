//! Fixed replies for well-known intents

use crate::IntentReply;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lookup table from intent name to a canned reply.
///
/// Intent names are matched case-insensitively. A hit replaces the reply
/// text returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct CannedReplies {
    replies: HashMap<String, String>,
}

impl CannedReplies {
    /// An empty table
    pub fn empty() -> Self {
        Self {
            replies: HashMap::new(),
        }
    }

    /// Add or replace the reply for an intent
    pub fn with_reply(mut self, intent: &str, reply: &str) -> Self {
        self.replies.insert(intent.to_lowercase(), reply.to_string());
        self
    }

    pub fn lookup(&self, intent: &str) -> Option<&str> {
        self.replies.get(&intent.to_lowercase()).map(String::as_str)
    }

    /// Override the reply text when the intent has a canned reply
    pub fn apply(&self, mut reply: IntentReply) -> IntentReply {
        if let Some(canned) = self.lookup(&reply.intent) {
            reply.reply = canned.to_string();
        }
        reply
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self::empty()
            .with_reply(
                "crop_recommendation",
                "Sure! Please share your soil type, pH, and rainfall details.",
            )
            .with_reply(
                "disease_detection",
                "You can upload a crop image in the disease detection section.",
            )
    }
}

impl From<HashMap<String, String>> for CannedReplies {
    fn from(map: HashMap<String, String>) -> Self {
        map.iter()
            .fold(Self::empty(), |table, (intent, reply)| table.with_reply(intent, reply))
    }
}

impl From<CannedReplies> for HashMap<String, String> {
    fn from(table: CannedReplies) -> Self {
        table.replies
    }
}
