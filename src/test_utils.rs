//! Test server builder and request helpers shared by unit and integration
//! tests.

use crate::cache::memory::MemoryCache;
use crate::config::Config;
use crate::database::entities::UserRecord;
use crate::database::{DatabaseManager, DatabaseManagerImpl};
use crate::openai::CompletionApi;
use crate::openai::mock::MockCompletionApi;
use crate::server::Server;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static DATASET_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique on-disk dataset directory, removed on drop.
pub struct DatasetDir {
    path: PathBuf,
}

impl DatasetDir {
    fn create() -> Self {
        let path = std::env::temp_dir().join(format!(
            "assistant-gateway-test-{}-{}",
            std::process::id(),
            DATASET_DIR_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn write(&self, dataset: &str, contents: &str) {
        std::fs::write(self.path.join(format!("{}.json", dataset)), contents).unwrap();
    }

    fn write_defaults(&self) {
        self.write(
            crate::datasets::SALES_DATA,
            r#"[
                {"quarter": "Q1", "year": 2024, "revenue": 125000, "units_sold": 310},
                {"quarter": "Q2", "year": 2024, "revenue": 150000, "units_sold": 365},
                {"quarter": "Q4", "year": 2023, "revenue": 90000, "units_sold": 240}
            ]"#,
        );
        self.write(
            crate::datasets::SALES_TARGETS,
            r#"[{"year": 2024, "target": 600000}]"#,
        );
        self.write(
            crate::datasets::TEAMS,
            r#"[{"name": "Engineering", "headcount": 12}, {"name": "Sales", "headcount": 8}]"#,
        );
        self.write(
            crate::datasets::EMPLOYEES,
            r#"[
                {"name": "Jane Doe", "role": "Manager", "engagement_score": 62, "training_completion": 80, "attendance_rate": 96},
                {"name": "Priya Patel", "role": "Engineer", "engagement_score": 88, "training_completion": 100, "attendance_rate": 99}
            ]"#,
        );
        self.write(
            crate::datasets::CUSTOMERS,
            r#"[{"name": "Global Tech", "industry": "Technology", "account_value": 250000}]"#,
        );
    }
}

impl Drop for DatasetDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

pub struct TestServerBuilder {
    config: Config,
    reply: Option<String>,
    usage: Option<(i64, i64, i64)>,
    chat_error: Option<(u16, String)>,
    flagged: bool,
    with_datasets: bool,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.database.url = "sqlite::memory:".to_string();
        config.auth.jwt_secret = "test-secret".to_string();
        config.openai.api_key = "sk-test".to_string();

        Self {
            config,
            reply: None,
            usage: None,
            chat_error: None,
            flagged: false,
            with_datasets: true,
        }
    }

    pub fn with_config(mut self, mutate: impl FnOnce(&mut Config)) -> Self {
        mutate(&mut self.config);
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn with_usage(mut self, prompt: i64, completion: i64, total: i64) -> Self {
        self.usage = Some((prompt, completion, total));
        self
    }

    pub fn with_chat_error(mut self, status: u16, message: &str) -> Self {
        self.chat_error = Some((status, message.to_string()));
        self
    }

    pub fn with_flagged_moderation(mut self) -> Self {
        self.flagged = true;
        self
    }

    pub fn with_monthly_limit(mut self, limit: i64) -> Self {
        self.config.limits.monthly_token_limit = limit;
        self
    }

    pub fn with_cache_disabled(mut self) -> Self {
        self.config.cache.response.enabled = false;
        self
    }

    /// Point the dataset store at a directory that does not exist.
    pub fn without_datasets(mut self) -> Self {
        self.with_datasets = false;
        self
    }

    pub async fn build(mut self) -> TestServer {
        let datasets = if self.with_datasets {
            let dir = DatasetDir::create();
            dir.write_defaults();
            self.config.datasets.path = dir.path().to_string_lossy().to_string();
            Some(dir)
        } else {
            self.config.datasets.path = std::env::temp_dir()
                .join("assistant-gateway-missing-datasets")
                .to_string_lossy()
                .to_string();
            None
        };

        let mut mock = MockCompletionApi::new().with_flagged(self.flagged);
        if let Some(reply) = &self.reply {
            mock = mock.with_reply(reply);
        }
        if let Some((prompt, completion, total)) = self.usage {
            mock = mock.with_usage(prompt, completion, total);
        }
        if let Some((status, message)) = &self.chat_error {
            mock = mock.with_chat_error(*status, message);
        }
        let mock = Arc::new(mock);

        let database: Arc<dyn DatabaseManager> = Arc::new(
            DatabaseManagerImpl::new_from_config(&self.config.database)
                .await
                .unwrap(),
        );
        database.migrate().await.unwrap();

        let server = Server::with_components(
            self.config,
            database,
            mock.clone() as Arc<dyn CompletionApi>,
            Arc::new(MemoryCache::new()),
        )
        .await
        .unwrap();

        TestServer {
            server,
            mock,
            _datasets: datasets,
        }
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestServer {
    pub server: Server,
    mock: Arc<MockCompletionApi>,
    _datasets: Option<DatasetDir>,
}

impl TestServer {
    pub fn app(&self) -> Router {
        self.server.create_app()
    }

    pub fn database(&self) -> &Arc<dyn DatabaseManager> {
        &self.server.database
    }

    pub fn mock(&self) -> &Arc<MockCompletionApi> {
        &self.mock
    }

    pub async fn create_user(&self, email: &str) -> UserRecord {
        self.server
            .database
            .users()
            .create(email, "Test User")
            .await
            .unwrap()
    }

    pub fn token_for(&self, user_id: i32) -> String {
        self.server.jwt_service.create_token(user_id).unwrap()
    }

    pub async fn create_log(&self, prompt: &str) -> i32 {
        self.server
            .database
            .logs()
            .create(crate::database::NewLogEntry {
                user_id: None,
                prompt: prompt.to_string(),
                response: "a reply".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                tokens_used: Some(10),
                cost: None,
                persona: "general".to_string(),
                context_used: false,
            })
            .await
            .unwrap()
            .id
    }
}

pub fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
