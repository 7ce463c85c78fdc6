use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound body for POST /api/ai/assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRequest {
    pub prompt: Option<String>,
    pub persona: Option<String>,
    #[serde(rename = "previousMessages")]
    pub previous_messages: Option<Vec<Value>>,
}

/// The normalized success payload; also what the response cache stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantResponse {
    pub id: Option<i32>,
    pub reply: String,
    pub timestamp: String,
}

/// Distinguishes the core answer from bookkeeping, so callers (and tests)
/// can assert on each independently.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub response: AssistantResponse,
    pub from_cache: bool,
    pub log_persisted: bool,
    pub usage_recorded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    pub response_id: Option<Value>,
    pub rating: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub message: String,
    pub status: String,
}
