use crate::database::entities::UserRecord;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::warn;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn resolve_user(server: &Server, token: &str) -> Result<UserRecord, AppError> {
    let claims = server.jwt_service.validate_token(token)?;
    server
        .database
        .users()
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AppError::Internal(format!("Database error: {}", e)))?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))
}

/// Rejects requests without a valid bearer token; the resolved user record
/// lands in request extensions for [`UserExtractor`].
pub async fn require_auth_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();

    let user = resolve_user(&server, &token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Resolves a user when a valid token is supplied, otherwise lets the
/// request through anonymously. Invalid tokens are logged, not rejected.
pub async fn optional_auth_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request).map(str::to_string) {
        match resolve_user(&server, &token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => {
                warn!("ignoring invalid bearer token: {}", e);
            }
        }
    }

    next.run(request).await
}

/// Extracts the authenticated user placed by [`require_auth_middleware`].
pub struct UserExtractor(pub UserRecord);

impl<S> FromRequestParts<S> for UserExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserRecord>()
            .cloned()
            .map(UserExtractor)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extracts the user if one was resolved, or None for anonymous callers.
pub struct OptionalUser(pub Option<UserRecord>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<UserRecord>().cloned()))
    }
}
