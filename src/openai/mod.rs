pub mod mock;
pub mod types;

use crate::config::OpenAiConfig;
use crate::health::{HealthCheckResult, HealthChecker};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use types::{ChatCompletionRequest, ChatCompletionResponse, ModerationRequest, ModerationResponse};

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("OpenAI transport error: {0}")]
    Transport(String),
}

pub type OpenAiResult<T> = Result<T, OpenAiError>;

/// Outbound seam to the completion provider. The orchestrator only ever
/// talks to this trait, so tests swap in [`mock::MockCompletionApi`].
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn chat_complete(
        &self,
        request: ChatCompletionRequest,
    ) -> OpenAiResult<ChatCompletionResponse>;

    async fn moderate(&self, input: &str) -> OpenAiResult<ModerationResponse>;
}

/// HTTP client for an OpenAI-compatible API with timeout and bounded retry.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_times: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> OpenAiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| OpenAiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry_times: config.retry_times,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// POST a JSON body, retrying transport errors and 429/5xx responses up
    /// to the configured bound with a fixed delay between attempts.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> OpenAiResult<R>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..=self.retry_times {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
                debug!(url = %url, attempt, "retrying upstream call");
            }

            let result = self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, attempt, "upstream transport error: {}", e);
                    last_error = Some(OpenAiError::Transport(e.to_string()));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<R>()
                    .await
                    .map_err(|e| OpenAiError::Transport(e.to_string()));
            }

            let message = extract_error_message(response).await;
            let error = OpenAiError::Api {
                status: status.as_u16(),
                message,
            };

            // Only 429 and server-side failures are worth retrying
            if status.as_u16() == 429 || status.is_server_error() {
                warn!(url = %url, attempt, status = status.as_u16(), "retryable upstream failure");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error
            .unwrap_or_else(|| OpenAiError::Transport("request never attempted".to_string())))
    }
}

async fn extract_error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("unexpected response body (status {})", status)),
        Err(_) => format!("unreadable response body (status {})", status),
    }
}

#[async_trait]
impl CompletionApi for OpenAiClient {
    async fn chat_complete(
        &self,
        request: ChatCompletionRequest,
    ) -> OpenAiResult<ChatCompletionResponse> {
        self.post_json("/chat/completions", &request).await
    }

    async fn moderate(&self, input: &str) -> OpenAiResult<ModerationResponse> {
        let request = ModerationRequest {
            input: input.to_string(),
        };
        self.post_json("/moderations", &request).await
    }
}

/// Reports provider configuration state without spending tokens on a probe.
pub struct OpenAiHealthChecker {
    base_url: String,
    model: String,
    has_credentials: bool,
}

impl OpenAiHealthChecker {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            has_credentials: !config.api_key.is_empty(),
        }
    }
}

#[async_trait]
impl HealthChecker for OpenAiHealthChecker {
    fn name(&self) -> &str {
        "openai"
    }

    async fn check(&self) -> HealthCheckResult {
        let details = serde_json::json!({
            "base_url": self.base_url,
            "model": self.model,
        });
        if self.has_credentials {
            HealthCheckResult::healthy_with_details(details)
        } else {
            HealthCheckResult::degraded_with_details("API key not configured".to_string(), details)
        }
    }
}
