//! The request orchestrator: validation, context injection, moderation,
//! caching, the remote completion call, and the bookkeeping that follows.

pub mod prompt;
pub mod types;

use crate::config::Config;
use crate::context::ContextSelector;
use crate::database::{DatabaseManager, NewLogEntry};
use crate::datasets::{DatasetStore, EMPLOYEES};
use crate::error::AppError;
use crate::openai::CompletionApi;
use crate::openai::types::{ChatCompletionRequest, ChatMessage};
use crate::cache::response::ResponseCache;
use prompt::{
    DEFAULT_PERSONA, FALLBACK_EMPTY, FALLBACK_UNEXPECTED, HISTORY_LIMIT, PERSONAS,
    REPORT_FALLBACK_EMPTY, REPORT_FALLBACK_UNEXPECTED, REPORT_LOG_PROMPT, REPORT_PERSONA,
    REPORT_SYSTEM_PROMPT,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use types::{AssistantRequest, AssistantResponse, GenerateOutcome};

const CHAT_TEMPERATURE: f32 = 0.5;
const REPORT_TEMPERATURE: f32 = 0.4;
const MAX_COMPLETION_TOKENS: u32 = 1500;

pub const MODERATION_FLAGGED_MESSAGE: &str =
    "Your prompt was flagged by our content moderation system";
pub const PROHIBITED_CONTENT_MESSAGE: &str = "Your prompt contains prohibited content";

struct ValidatedRequest {
    prompt: String,
    persona: String,
    history: Vec<ChatMessage>,
}

pub struct AssistantService {
    config: Config,
    selector: ContextSelector,
    completion: Arc<dyn CompletionApi>,
    cache: ResponseCache,
    database: Arc<dyn DatabaseManager>,
}

impl AssistantService {
    pub fn new(
        config: Config,
        completion: Arc<dyn CompletionApi>,
        cache: ResponseCache,
        database: Arc<dyn DatabaseManager>,
    ) -> Self {
        let selector = ContextSelector::new(DatasetStore::new(&config.datasets.path));
        Self {
            config,
            selector,
            completion,
            cache,
            database,
        }
    }

    /// The end-to-end assistant flow. Only validation, moderation, and the
    /// remote call can fail the request; log and usage writes are swallowed.
    pub async fn generate(
        &self,
        request: AssistantRequest,
        user_id: Option<i32>,
    ) -> Result<GenerateOutcome, AppError> {
        let validated = self.validate(request)?;

        let context = self.selector.select(&validated.prompt);
        let context_used = context.is_some();
        let augmented = prompt::augment(&validated.prompt, context.as_deref());

        self.moderation_gate(&validated.prompt).await?;

        let cache_key = ResponseCache::key(
            &augmented,
            &validated.persona,
            &history_values(&validated.history),
        );

        if !context_used {
            if let Some(payload) = self.cache.get(&cache_key).await {
                if let Ok(response) = serde_json::from_value::<AssistantResponse>(payload) {
                    debug!("serving assistant response from cache");
                    return Ok(GenerateOutcome {
                        response,
                        from_cache: true,
                        log_persisted: false,
                        usage_recorded: false,
                    });
                }
            }
        }

        let mut messages = vec![ChatMessage::system(prompt::system_prompt(
            &validated.persona,
        ))];
        messages.extend(validated.history.iter().cloned());
        messages.push(ChatMessage::user(augmented.clone()));

        let completion = self
            .completion
            .chat_complete(ChatCompletionRequest {
                model: self.config.openai.model.clone(),
                messages,
                temperature: CHAT_TEMPERATURE,
                max_tokens: MAX_COMPLETION_TOKENS,
            })
            .await?;

        let reply = extract_reply(
            completion.content_text(),
            FALLBACK_UNEXPECTED,
            FALLBACK_EMPTY,
        );

        let model_used = completion
            .model
            .clone()
            .unwrap_or_else(|| self.config.openai.model.clone());
        let tokens = count_tokens(&completion, &augmented, &reply);
        let cost = prompt::estimate_cost(tokens, &model_used);

        let (log_id, log_persisted) = self
            .persist_log(NewLogEntry {
                user_id,
                prompt: validated.prompt.clone(),
                response: reply.clone(),
                model: Some(model_used),
                tokens_used: Some(tokens.min(i32::MAX as i64) as i32),
                cost: Some(cost),
                persona: validated.persona.clone(),
                context_used,
            })
            .await;

        let usage_recorded = self.record_usage(user_id, tokens, cost).await;

        let response = AssistantResponse {
            id: log_id,
            reply,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        if !context_used {
            if let Ok(payload) = serde_json::to_value(&response) {
                if let Err(e) = self.cache.put(&cache_key, payload).await {
                    warn!("response cache write failed: {}", e);
                }
            }
        }

        Ok(GenerateOutcome {
            response,
            from_cache: false,
            log_persisted,
            usage_recorded,
        })
    }

    /// Trend summary over the employee dataset with a fixed prompt template.
    pub async fn generate_report(
        &self,
        user_id: Option<i32>,
    ) -> Result<GenerateOutcome, AppError> {
        let employees = DatasetStore::new(&self.config.datasets.path).dataset(EMPLOYEES);
        if employees.is_empty() {
            return Err(AppError::NotFound(
                "Employee data required for the report is currently unavailable.".to_string(),
            ));
        }

        let data = serde_json::to_string(&employees)
            .map_err(|e| AppError::Internal(format!("dataset serialization failed: {}", e)))?;
        let report_prompt = prompt::report_prompt(&data);

        let completion = self
            .completion
            .chat_complete(ChatCompletionRequest {
                model: self.config.openai.model.clone(),
                messages: vec![
                    ChatMessage::system(REPORT_SYSTEM_PROMPT),
                    ChatMessage::user(report_prompt.clone()),
                ],
                temperature: REPORT_TEMPERATURE,
                max_tokens: MAX_COMPLETION_TOKENS,
            })
            .await?;

        let reply = extract_reply(
            completion.content_text(),
            REPORT_FALLBACK_UNEXPECTED,
            REPORT_FALLBACK_EMPTY,
        );

        let model_used = completion
            .model
            .clone()
            .unwrap_or_else(|| self.config.openai.model.clone());
        let tokens = count_tokens(&completion, &report_prompt, &reply);
        let cost = prompt::estimate_cost(tokens, &model_used);

        let (log_id, log_persisted) = self
            .persist_log(NewLogEntry {
                user_id,
                prompt: REPORT_LOG_PROMPT.to_string(),
                response: reply.clone(),
                model: Some(model_used),
                tokens_used: Some(tokens.min(i32::MAX as i64) as i32),
                cost: Some(cost),
                persona: REPORT_PERSONA.to_string(),
                context_used: true,
            })
            .await;

        let usage_recorded = self.record_usage(user_id, tokens, cost).await;

        Ok(GenerateOutcome {
            response: AssistantResponse {
                id: log_id,
                reply,
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
            from_cache: false,
            log_persisted,
            usage_recorded,
        })
    }

    fn validate(&self, request: AssistantRequest) -> Result<ValidatedRequest, AppError> {
        let prompt = request
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("The prompt field is required".to_string()))?
            .to_string();

        if prompt.chars().count() > self.config.limits.max_prompt_length {
            return Err(AppError::Validation(format!(
                "Your prompt exceeds the maximum length of {} characters",
                self.config.limits.max_prompt_length
            )));
        }

        if self.config.moderation.enabled {
            let lowered = prompt.to_lowercase();
            if self
                .config
                .moderation
                .prohibited_terms
                .iter()
                .any(|term| lowered.contains(&term.to_lowercase()))
            {
                return Err(AppError::Moderation(PROHIBITED_CONTENT_MESSAGE.to_string()));
            }
        }

        let persona = match request.persona.as_deref() {
            None | Some("") => DEFAULT_PERSONA.to_string(),
            Some(p) if PERSONAS.contains(&p) => p.to_string(),
            Some(p) => {
                return Err(AppError::Validation(format!("Invalid persona: {}", p)));
            }
        };

        let history = trim_history(request.previous_messages.unwrap_or_default());

        Ok(ValidatedRequest {
            prompt,
            persona,
            history,
        })
    }

    async fn moderation_gate(&self, prompt: &str) -> Result<(), AppError> {
        if !self.config.moderation.enabled {
            return Ok(());
        }
        let result = self.completion.moderate(prompt).await?;
        if result.flagged() {
            return Err(AppError::Moderation(MODERATION_FLAGGED_MESSAGE.to_string()));
        }
        Ok(())
    }

    async fn persist_log(&self, entry: NewLogEntry) -> (Option<i32>, bool) {
        match self.database.logs().create(entry).await {
            Ok(log) => (Some(log.id), true),
            Err(e) => {
                warn!("failed to persist interaction log: {}", e);
                (None, false)
            }
        }
    }

    async fn record_usage(&self, user_id: Option<i32>, tokens: i64, cost: Decimal) -> bool {
        let Some(user_id) = user_id else {
            return false;
        };
        if tokens <= 0 {
            return false;
        }

        let month = crate::database::dao::usage::current_month();
        match self
            .database
            .usage()
            .record(user_id, &month, tokens, cost)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id, "failed to record usage: {}", e);
                false
            }
        }
    }
}

/// Keep the last few turns, dropping anything that is not a well-formed
/// {role, content} pair with a known role.
fn trim_history(messages: Vec<Value>) -> Vec<ChatMessage> {
    let start = messages.len().saturating_sub(HISTORY_LIMIT);
    messages[start..]
        .iter()
        .filter_map(|entry| {
            let role = entry.get("role")?.as_str()?;
            let content = entry.get("content")?.as_str()?;
            if matches!(role, "user" | "assistant" | "system") {
                Some(ChatMessage::new(role, content))
            } else {
                None
            }
        })
        .collect()
}

fn history_values(history: &[ChatMessage]) -> Vec<Value> {
    history
        .iter()
        .filter_map(|m| serde_json::to_value(m).ok())
        .collect()
}

fn extract_reply(
    content: Option<&str>,
    unexpected_fallback: &str,
    empty_fallback: &str,
) -> String {
    match content {
        None => {
            warn!("provider response had missing or non-text content");
            unexpected_fallback.to_string()
        }
        Some(text) if text.trim().is_empty() => empty_fallback.to_string(),
        Some(text) => text.trim().to_string(),
    }
}

/// Prefer provider-reported counts, fall back to character estimates.
fn count_tokens(
    completion: &crate::openai::types::ChatCompletionResponse,
    sent: &str,
    reply: &str,
) -> i64 {
    let usage = completion.usage.unwrap_or_default();
    if let Some(total) = usage.total_tokens {
        return total.max(0);
    }
    let prompt_tokens = usage
        .prompt_tokens
        .unwrap_or_else(|| prompt::estimate_tokens(sent));
    let completion_tokens = usage
        .completion_tokens
        .unwrap_or_else(|| prompt::estimate_tokens(reply));
    (prompt_tokens + completion_tokens).max(0)
}
