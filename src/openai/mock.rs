//! In-memory stand-in for the completion provider, used by unit and
//! integration tests to script replies without network access.

use super::types::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ModerationResponse,
    ModerationResult, ResponseMessage, TokenUsage,
};
use super::{CompletionApi, OpenAiError, OpenAiResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockCompletionApi {
    reply: Mutex<Option<Value>>,
    usage: Mutex<Option<TokenUsage>>,
    chat_error: Mutex<Option<(u16, String)>>,
    flagged: Mutex<bool>,
    chat_calls: AtomicUsize,
    moderation_calls: AtomicUsize,
    last_request: Mutex<Option<ChatCompletionRequest>>,
}

impl MockCompletionApi {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(Some(Value::String("mock reply".to_string()))),
            ..Self::default()
        }
    }

    pub fn with_reply(self, reply: &str) -> Self {
        *self.reply.lock().unwrap() = Some(Value::String(reply.to_string()));
        self
    }

    /// Provider returns a payload whose content field is not a string.
    pub fn with_malformed_content(self) -> Self {
        *self.reply.lock().unwrap() = Some(serde_json::json!({"oops": true}));
        self
    }

    /// Provider returns no choices at all.
    pub fn with_missing_content(self) -> Self {
        *self.reply.lock().unwrap() = None;
        self
    }

    pub fn with_usage(self, prompt: i64, completion: i64, total: i64) -> Self {
        *self.usage.lock().unwrap() = Some(TokenUsage {
            prompt_tokens: Some(prompt),
            completion_tokens: Some(completion),
            total_tokens: Some(total),
        });
        self
    }

    pub fn with_chat_error(self, status: u16, message: &str) -> Self {
        *self.chat_error.lock().unwrap() = Some((status, message.to_string()));
        self
    }

    pub fn with_flagged(self, flagged: bool) -> Self {
        *self.flagged.lock().unwrap() = flagged;
        self
    }

    pub fn set_reply(&self, reply: &str) {
        *self.reply.lock().unwrap() = Some(Value::String(reply.to_string()));
    }

    pub fn chat_call_count(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn moderation_call_count(&self) -> usize {
        self.moderation_calls.load(Ordering::SeqCst)
    }

    /// The most recent chat request, for asserting on assembled messages.
    pub fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionApi for MockCompletionApi {
    async fn chat_complete(
        &self,
        request: ChatCompletionRequest,
    ) -> OpenAiResult<ChatCompletionResponse> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some((status, message)) = self.chat_error.lock().unwrap().clone() {
            return Err(OpenAiError::Api { status, message });
        }

        let choices = self.reply.lock().unwrap().clone().map(|content| {
            vec![ChatChoice {
                message: Some(ResponseMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content),
                }),
            }]
        });

        Ok(ChatCompletionResponse {
            id: Some("chatcmpl-mock".to_string()),
            model: Some(request.model),
            choices,
            usage: *self.usage.lock().unwrap(),
        })
    }

    async fn moderate(&self, _input: &str) -> OpenAiResult<ModerationResponse> {
        self.moderation_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModerationResponse {
            results: Some(vec![ModerationResult {
                flagged: Some(*self.flagged.lock().unwrap()),
                categories: None,
            }]),
        })
    }
}
