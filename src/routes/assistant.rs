use crate::assistant::types::{AssistantRequest, AssistantResponse};
use crate::auth::OptionalUser;
use crate::error::AppError;
use crate::server::Server;
use axum::{Json, Router, extract::State, routing::post};

pub fn create_assistant_routes() -> Router<Server> {
    Router::new()
        .route("/assistant", post(handle_assistant))
        .route("/report", post(handle_report))
}

async fn handle_assistant(
    State(server): State<Server>,
    OptionalUser(user): OptionalUser,
    Json(body): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, AppError> {
    let outcome = server
        .assistant
        .generate(body, user.map(|u| u.id))
        .await?;
    Ok(Json(outcome.response))
}

async fn handle_report(
    State(server): State<Server>,
    OptionalUser(user): OptionalUser,
) -> Result<Json<AssistantResponse>, AppError> {
    let outcome = server.assistant.generate_report(user.map(|u| u.id)).await?;
    Ok(Json(outcome.response))
}
