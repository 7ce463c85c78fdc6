use assistant_gateway::database::dao::usage::current_month;
use assistant_gateway::test_utils::{TestServerBuilder, body_json, get_request, post_json};
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_authenticated_requests_accumulate_usage() {
    let test_server = TestServerBuilder::new()
        .with_usage(12, 8, 20)
        .with_cache_disabled()
        .build()
        .await;
    let user = test_server.create_user("spender@example.com").await;
    let token = test_server.token_for(user.id);
    let app = test_server.app();

    for prompt in ["first question", "second question"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/ai/assistant",
                json!({"prompt": prompt}),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_request("/api/ai/usage", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["usage"]["usage"], 40);
    assert_eq!(body["usage"]["limit_exceeded"], false);

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["tokens_used"], 40);
}

#[tokio::test]
async fn test_anonymous_requests_record_no_usage() {
    let test_server = TestServerBuilder::new().with_usage(10, 10, 20).build().await;
    let user = test_server.create_user("observer@example.com").await;
    let app = test_server.app();

    let response = app
        .oneshot(post_json(
            "/api/ai/assistant",
            json!({"prompt": "anonymous question"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let used = test_server
        .database()
        .usage()
        .tokens_used_in_month(user.id, &current_month())
        .await
        .unwrap();
    assert_eq!(used, 0);
}

#[tokio::test]
async fn test_feedback_flow_through_stats() {
    let test_server = TestServerBuilder::new().build().await;
    let user = test_server.create_user("reviewer@example.com").await;
    let token = test_server.token_for(user.id);
    let app = test_server.app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ai/assistant",
            json!({"prompt": "rate this later"}),
            None,
        ))
        .await
        .unwrap();
    let log_id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ai/feedback",
            json!({"response_id": log_id, "rating": "helpful", "comment": "good answer"}),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/ai/feedback/stats", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["helpful"], 1);
    assert_eq!(body["helpful_percentage"], 100.0);
}
