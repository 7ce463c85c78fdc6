use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Moderation rejected: {0}")]
    Moderation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream call failed ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::database::DatabaseError> for AppError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::NotFound => {
                AppError::NotFound("Record not found".to_string())
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<crate::openai::OpenAiError> for AppError {
    fn from(err: crate::openai::OpenAiError) -> Self {
        match err {
            crate::openai::OpenAiError::Api { status, message } => {
                AppError::Upstream { status, message }
            }
            crate::openai::OpenAiError::Transport(message) => AppError::Upstream {
                status: 502,
                message,
            },
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Unauthorized(format!("Invalid token: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Moderation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()),
            // Upstream detail stays in the server logs, not the response body
            AppError::Upstream { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sorry, I encountered an error processing your request.".to_string(),
            ),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("prompt is required".to_string());
        assert_eq!(err.to_string(), "Validation error: prompt is required");

        let err = AppError::Upstream {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream call failed (429): rate limited");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Validation("bad".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Moderation("flagged".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::NotFound("missing".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Unauthorized("no token".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Upstream {
                    status: 503,
                    message: "overloaded".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_database_error_conversion() {
        let err: AppError = crate::database::DatabaseError::NotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = crate::database::DatabaseError::Database("locked".to_string()).into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
