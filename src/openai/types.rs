use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Provider response shapes are deliberately loose: every field is optional
/// and `content` is an untyped value, so missing or wrongly-typed fields are
/// ordinary cases rather than deserialization failures.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub choices: Option<Vec<ChatChoice>>,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatChoice {
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponseMessage {
    pub role: Option<String>,
    pub content: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}

impl ChatCompletionResponse {
    /// The first choice's content, only if it is actually a string.
    pub fn content_text(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .message
            .as_ref()?
            .content
            .as_ref()?
            .as_str()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRequest {
    pub input: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModerationResponse {
    pub results: Option<Vec<ModerationResult>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModerationResult {
    pub flagged: Option<bool>,
    pub categories: Option<Value>,
}

impl ModerationResponse {
    pub fn flagged(&self) -> bool {
        self.results
            .as_ref()
            .and_then(|r| r.first())
            .and_then(|r| r.flagged)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_text_happy_path() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        assert_eq!(response.content_text(), Some("Hello"));
        assert_eq!(response.usage.unwrap().total_tokens, Some(15));
    }

    #[test]
    fn test_content_text_missing_fields() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.content_text(), None);

        let no_message: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{}]})).unwrap();
        assert_eq!(no_message.content_text(), None);
    }

    #[test]
    fn test_content_text_wrong_type() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": {"unexpected": "object"}}}]
        }))
        .unwrap();
        assert_eq!(response.content_text(), None);
    }

    #[test]
    fn test_moderation_flagged() {
        let flagged: ModerationResponse = serde_json::from_value(json!({
            "results": [{"flagged": true, "categories": {"hate": true}}]
        }))
        .unwrap();
        assert!(flagged.flagged());

        let clean: ModerationResponse =
            serde_json::from_value(json!({"results": [{"flagged": false}]})).unwrap();
        assert!(!clean.flagged());

        let empty = ModerationResponse::default();
        assert!(!empty.flagged());
    }
}
