//! Public types for the copilot AI API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::TransformOutcome;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    pub message: Option<String>,
    pub session_id: Option<String>,
    // Summary of the customer conversation shown next to the copilot
    pub chat_context: Option<String>,
}

#[derive(Deserialize)]
pub struct TransformRequest {
    pub action: Option<String>,
    // Anything other than a string is treated as missing
    pub text: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    pub transformed_text: String,
    pub action: String,
    pub original_length: usize,
    pub transformed_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<TransformOutcome> for TransformResponse {
    fn from(outcome: TransformOutcome) -> Self {
        Self {
            transformed_text: outcome.transformed_text,
            action: outcome.action.to_string(),
            original_length: outcome.original_length,
            transformed_length: outcome.transformed_length,
            note: outcome.note,
        }
    }
}
