use crate::assistant::types::{FeedbackRequest, FeedbackResponse};
use crate::auth::{OptionalUser, UserExtractor};
use crate::database::FeedbackStats;
use crate::database::entities::Rating;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::Value;
use tracing::warn;

pub fn create_feedback_routes() -> Router<Server> {
    Router::new().route("/feedback", post(handle_feedback))
}

pub fn create_feedback_stats_routes() -> Router<Server> {
    Router::new().route("/feedback/stats", get(handle_feedback_stats))
}

async fn handle_feedback(
    State(server): State<Server>,
    OptionalUser(user): OptionalUser,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let log_id = parse_response_id(body.response_id.as_ref())?;
    let rating = body
        .rating
        .as_deref()
        .and_then(Rating::parse)
        .ok_or_else(|| {
            AppError::Validation("The rating must be helpful or not_helpful".to_string())
        })?;

    // Referential check before insert; SQLite has no FK backstop here
    server
        .database
        .logs()
        .find_by_id(log_id)
        .await?
        .ok_or_else(|| AppError::Validation("The selected response id is invalid".to_string()))?;

    server
        .database
        .feedback()
        .create(log_id, user.map(|u| u.id), rating.clone(), body.comment)
        .await?;

    // Mirroring the rating onto the log row is best-effort
    if let Err(e) = server.database.logs().attach_feedback(log_id, rating).await {
        warn!(log_id, "failed to mirror feedback onto log: {}", e);
    }

    Ok(Json(FeedbackResponse {
        message: "Feedback recorded successfully".to_string(),
        status: "success".to_string(),
    }))
}

async fn handle_feedback_stats(
    State(server): State<Server>,
    UserExtractor(_user): UserExtractor,
) -> Result<Json<FeedbackStats>, AppError> {
    let stats = server.database.feedback().stats().await?;
    Ok(Json(stats))
}

fn parse_response_id(value: Option<&Value>) -> Result<i32, AppError> {
    let invalid = || AppError::Validation("The response id field is required".to_string());
    let value = value.ok_or_else(invalid)?;
    let id = match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid)?,
        Value::String(s) => s.parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    i32::try_from(id).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestServerBuilder, body_json, get_request, post_json};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_parse_response_id() {
        assert_eq!(parse_response_id(Some(&json!(7))).unwrap(), 7);
        assert_eq!(parse_response_id(Some(&json!("12"))).unwrap(), 12);
        assert!(parse_response_id(Some(&json!(1.5))).is_err());
        assert!(parse_response_id(Some(&json!(["nope"]))).is_err());
        assert!(parse_response_id(None).is_err());
    }

    #[tokio::test]
    async fn test_feedback_round_trip() {
        let test_server = TestServerBuilder::new().build().await;
        let log_id = test_server.create_log("a prompt").await;
        let app = test_server.app();

        let request = post_json(
            "/api/ai/feedback",
            json!({"response_id": log_id, "rating": "helpful", "comment": "spot on"}),
            None,
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Feedback recorded successfully");
        assert_eq!(body["status"], "success");

        let count = test_server
            .database()
            .feedback()
            .count_for_log(log_id)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let log = test_server
            .database()
            .logs()
            .find_by_id(log_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(log.feedback.as_deref(), Some("helpful"));
    }

    #[tokio::test]
    async fn test_feedback_unknown_log_creates_no_row() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let request = post_json(
            "/api/ai/feedback",
            json!({"response_id": 9999, "rating": "helpful"}),
            None,
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let count = test_server
            .database()
            .feedback()
            .count_for_log(9999)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_feedback_invalid_rating_rejected() {
        let test_server = TestServerBuilder::new().build().await;
        let log_id = test_server.create_log("a prompt").await;
        let app = test_server.app();

        let request = post_json(
            "/api/ai/feedback",
            json!({"response_id": log_id, "rating": "amazing"}),
            None,
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_feedback_stats_requires_auth() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let response = app
            .oneshot(get_request("/api/ai/feedback/stats", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_feedback_stats_aggregation() {
        let test_server = TestServerBuilder::new().build().await;
        let user = test_server.create_user("viewer@example.com").await;
        let token = test_server.token_for(user.id);

        let log_id = test_server.create_log("a prompt").await;
        for rating in [Rating::Helpful, Rating::Helpful, Rating::NotHelpful] {
            test_server
                .database()
                .feedback()
                .create(log_id, None, rating, None)
                .await
                .unwrap();
        }

        let app = test_server.app();
        let response = app
            .oneshot(get_request("/api/ai/feedback/stats", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["helpful"], 2);
        assert_eq!(body["not_helpful"], 1);
        assert_eq!(body["helpful_percentage"], 66.67);
    }
}
