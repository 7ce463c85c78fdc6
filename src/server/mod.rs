use crate::assistant::AssistantService;
use crate::auth::jwt::{JwtService, JwtServiceImpl};
use crate::auth::middleware::{optional_auth_middleware, require_auth_middleware};
use crate::cache::response::ResponseCache;
use crate::cache::{CacheBackend, CacheHealthChecker};
use crate::config::Config;
use crate::database::{DatabaseHealthChecker, DatabaseManager, DatabaseManagerImpl};
use crate::error::AppError;
use crate::health::HealthService;
use crate::openai::{CompletionApi, OpenAiClient, OpenAiHealthChecker};
use crate::routes::{
    assistant::create_assistant_routes,
    feedback::{create_feedback_routes, create_feedback_stats_routes},
    health::create_health_routes,
    usage::create_usage_routes,
};
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared application state: configuration plus Arc'd services.
#[derive(Clone)]
pub struct Server {
    pub config: Config,
    pub database: Arc<dyn DatabaseManager>,
    pub jwt_service: Arc<dyn JwtService>,
    pub assistant: Arc<AssistantService>,
    pub health_service: Arc<HealthService>,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let cache_backend = crate::cache::new_from_config(&config.cache)
            .map_err(|e| AppError::Internal(format!("cache init failed: {}", e)))?;

        let database: Arc<dyn DatabaseManager> =
            Arc::new(DatabaseManagerImpl::new_from_config(&config.database).await?);

        let completion: Arc<dyn CompletionApi> = Arc::new(OpenAiClient::new(&config.openai)?);

        Self::with_components(config, database, completion, cache_backend).await
    }

    /// Wire the server from pre-built collaborators. Tests inject mock
    /// components through this.
    pub async fn with_components(
        config: Config,
        database: Arc<dyn DatabaseManager>,
        completion: Arc<dyn CompletionApi>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Result<Self, AppError> {
        let jwt_service: Arc<dyn JwtService> = Arc::new(JwtServiceImpl::new(&config.auth));

        let response_cache = ResponseCache::new(cache_backend.clone(), &config.cache.response);
        let assistant = Arc::new(AssistantService::new(
            config.clone(),
            completion,
            response_cache,
            database.clone(),
        ));

        let health_service = Arc::new(HealthService::new());
        health_service
            .register(Arc::new(DatabaseHealthChecker::new(database.clone())))
            .await;
        health_service
            .register(Arc::new(CacheHealthChecker::new(cache_backend)))
            .await;
        health_service
            .register(Arc::new(OpenAiHealthChecker::new(&config.openai)))
            .await;

        Ok(Self {
            config,
            database,
            jwt_service,
            assistant,
            health_service,
        })
    }

    pub fn create_app(&self) -> Router {
        Router::new()
            .nest("/api/ai", self.public_api_routes())
            .nest("/api/ai", self.protected_api_routes())
            .nest("/health", create_health_routes())
            .with_state(self.clone())
    }

    /// Assistant, report, and feedback accept anonymous callers; a valid
    /// bearer token attaches the user for billing and attribution.
    fn public_api_routes(&self) -> Router<Server> {
        create_assistant_routes()
            .merge(create_feedback_routes())
            .layer(middleware::from_fn_with_state(
                self.clone(),
                optional_auth_middleware,
            ))
    }

    fn protected_api_routes(&self) -> Router<Server> {
        create_usage_routes()
            .merge(create_feedback_stats_routes())
            .layer(middleware::from_fn_with_state(
                self.clone(),
                require_auth_middleware,
            ))
    }

    pub async fn run(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        self.database.migrate().await?;
        info!("Database migrations completed successfully");

        let app = self.create_app();

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid listen address: {}", e)))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{TestServerBuilder, get_request, post_json};
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let response = app
            .oneshot(get_request("/api/ai/nonexistent", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_anonymous_assistant_request_allowed() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let response = app
            .oneshot(post_json("/api/ai/assistant", json!({"prompt": "hi"}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_token_on_public_route_is_ignored() {
        let test_server = TestServerBuilder::new().build().await;
        let app = test_server.app();

        let mut request = post_json("/api/ai/assistant", json!({"prompt": "hi"}), None);
        request.headers_mut().insert(
            axum::http::header::AUTHORIZATION,
            "Bearer bogus.token.here".parse().unwrap(),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
