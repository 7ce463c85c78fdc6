use crate::auth::UserExtractor;
use crate::database::QuotaStatus;
use crate::database::dao::usage::{current_month, month_label};
use crate::error::AppError;
use crate::server::Server;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

const HISTORY_MONTHS: u64 = 6;

#[derive(Debug, Serialize)]
struct UsageOverview {
    usage: QuotaStatus,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    month: String,
    tokens_used: i64,
}

pub fn create_usage_routes() -> Router<Server> {
    Router::new().route("/usage", get(handle_usage))
}

async fn handle_usage(
    State(server): State<Server>,
    UserExtractor(user): UserExtractor,
) -> Result<Json<UsageOverview>, AppError> {
    let usage_dao = server.database.usage();

    let used = usage_dao
        .tokens_used_in_month(user.id, &current_month())
        .await?;
    let usage = QuotaStatus::compute(used, server.config.limits.monthly_token_limit);

    let history = usage_dao
        .history(user.id, HISTORY_MONTHS)
        .await?
        .into_iter()
        .map(|record| HistoryEntry {
            month: month_label(&record.month),
            tokens_used: record.tokens_used,
        })
        .collect();

    Ok(Json(UsageOverview { usage, history }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestServerBuilder, body_json, get_request};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_usage_requires_auth() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let response = app.oneshot(get_request("/api/ai/usage", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_usage_rejects_bad_token() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let response = app
            .oneshot(get_request("/api/ai/usage", Some("not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_usage_overview_with_history() {
        let test_server = TestServerBuilder::new().build().await;
        let user = test_server.create_user("quota@example.com").await;
        let token = test_server.token_for(user.id);

        let month = crate::database::dao::usage::current_month();
        test_server
            .database()
            .usage()
            .record(user.id, "2025-01", 1_000, Decimal::ZERO)
            .await
            .unwrap();
        test_server
            .database()
            .usage()
            .record(user.id, &month, 25_000, Decimal::new(5, 2))
            .await
            .unwrap();

        let app = test_server.app();
        let response = app
            .oneshot(get_request("/api/ai/usage", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["usage"]["usage"], 25_000);
        assert_eq!(body["usage"]["limit"], 100_000);
        assert_eq!(body["usage"]["remaining"], 75_000);
        assert_eq!(body["usage"]["percentage"], 25.0);
        assert_eq!(body["usage"]["limit_exceeded"], false);

        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["month"], "Jan 2025");
        assert_eq!(history[0]["tokens_used"], 1_000);
    }

    #[tokio::test]
    async fn test_usage_with_no_rows_is_zero() {
        let test_server = TestServerBuilder::new().build().await;
        let user = test_server.create_user("fresh@example.com").await;
        let token = test_server.token_for(user.id);
        let app = test_server.app();

        let response = app
            .oneshot(get_request("/api/ai/usage", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["usage"]["usage"], 0);
        assert!(body["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlimited_quota() {
        let test_server = TestServerBuilder::new().with_monthly_limit(0).build().await;
        let user = test_server.create_user("vip@example.com").await;
        let token = test_server.token_for(user.id);

        let month = crate::database::dao::usage::current_month();
        test_server
            .database()
            .usage()
            .record(user.id, &month, 5_000_000, Decimal::ZERO)
            .await
            .unwrap();

        let app = test_server.app();
        let response = app
            .oneshot(get_request("/api/ai/usage", Some(&token)))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["usage"]["limit_exceeded"], false);
        assert_eq!(body["usage"]["percentage"], 0.0);
        assert_eq!(body["usage"]["remaining"], i64::MAX);
    }
}
