//! Database access layer with domain-specific DAOs.

use crate::config::DatabaseConfig;
use crate::health::{HealthCheckResult, HealthChecker};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use thiserror::Error;

pub mod dao;
pub mod entities;
pub mod migration;

pub use dao::{FeedbackDao, FeedbackStats, LogsDao, NewLogEntry, QuotaStatus, UsageDao, UsersDao};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Migration error: {0}")]
    Migration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database manager trait for dependency injection and testing
#[async_trait]
pub trait DatabaseManager: Send + Sync {
    /// Run database migrations
    async fn migrate(&self) -> DatabaseResult<()>;

    /// Health check for database connection
    async fn health_check(&self) -> DatabaseResult<()>;

    fn users(&self) -> UsersDao;

    fn logs(&self) -> LogsDao;

    fn feedback(&self) -> FeedbackDao;

    fn usage(&self) -> UsageDao;

    /// Direct connection, for migrations and admin operations
    fn connection(&self) -> &DatabaseConnection;
}

pub struct DatabaseManagerImpl {
    pub connection: DatabaseConnection,
}

impl DatabaseManagerImpl {
    pub async fn new_from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let connection = sea_orm::Database::connect(&config.url)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl DatabaseManager for DatabaseManagerImpl {
    async fn migrate(&self) -> DatabaseResult<()> {
        use crate::database::migration::Migrator;
        use sea_orm_migration::MigratorTrait;

        tracing::info!("Running database migrations");

        Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Successfully completed all migrations");
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<()> {
        self.connection
            .ping()
            .await
            .map_err(|e| DatabaseError::Database(format!("db error: {}", e)))
    }

    fn users(&self) -> UsersDao {
        UsersDao::new(self.connection.clone())
    }

    fn logs(&self) -> LogsDao {
        LogsDao::new(self.connection.clone())
    }

    fn feedback(&self) -> FeedbackDao {
        FeedbackDao::new(self.connection.clone())
    }

    fn usage(&self) -> UsageDao {
        UsageDao::new(self.connection.clone())
    }

    fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

pub struct DatabaseHealthChecker {
    database: Arc<dyn DatabaseManager>,
}

impl DatabaseHealthChecker {
    pub fn new(database: Arc<dyn DatabaseManager>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl HealthChecker for DatabaseHealthChecker {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthCheckResult {
        match self.database.health_check().await {
            Ok(()) => HealthCheckResult::healthy(),
            Err(e) => HealthCheckResult::unhealthy(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::Rating;
    use rust_decimal::Decimal;

    async fn memory_database() -> DatabaseManagerImpl {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        };
        let db = DatabaseManagerImpl::new_from_config(&config).await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_migrate_and_ping() {
        let db = memory_database().await;
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let db = memory_database().await;
        let user = db.users().create("a@example.com", "Alice").await.unwrap();
        assert!(user.id > 0);

        let found = db.users().find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "a@example.com");

        let by_email = db
            .users()
            .find_by_email("a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_log_creation_and_feedback_attachment() {
        let db = memory_database().await;
        let log = db
            .logs()
            .create(NewLogEntry {
                user_id: None,
                prompt: "hello".to_string(),
                response: "hi".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                tokens_used: Some(10),
                cost: Some(Decimal::new(15, 7)),
                persona: "general".to_string(),
                context_used: false,
            })
            .await
            .unwrap();

        assert!(log.id > 0);
        assert!(log.feedback.is_none());

        db.logs()
            .attach_feedback(log.id, Rating::Helpful)
            .await
            .unwrap();

        let updated = db.logs().find_by_id(log.id).await.unwrap().unwrap();
        assert_eq!(updated.feedback.as_deref(), Some("helpful"));
        assert!(updated.feedback_at.is_some());
    }

    #[tokio::test]
    async fn test_feedback_stats() {
        let db = memory_database().await;
        let log = db
            .logs()
            .create(NewLogEntry {
                user_id: None,
                prompt: "p".to_string(),
                response: "r".to_string(),
                model: None,
                tokens_used: None,
                cost: None,
                persona: "general".to_string(),
                context_used: false,
            })
            .await
            .unwrap();

        db.feedback()
            .create(log.id, None, Rating::Helpful, None)
            .await
            .unwrap();
        db.feedback()
            .create(log.id, None, Rating::Helpful, Some("great".to_string()))
            .await
            .unwrap();
        db.feedback()
            .create(log.id, None, Rating::NotHelpful, None)
            .await
            .unwrap();

        let stats = db.feedback().stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.helpful, 2);
        assert_eq!(stats.not_helpful, 1);
        assert_eq!(stats.helpful_percentage, 66.67);
    }

    #[tokio::test]
    async fn test_usage_upsert_accumulates() {
        let db = memory_database().await;
        let user = db.users().create("u@example.com", "U").await.unwrap();

        db.usage()
            .record(user.id, "2025-04", 100, Decimal::new(1, 4))
            .await
            .unwrap();
        db.usage()
            .record(user.id, "2025-04", 250, Decimal::new(2, 4))
            .await
            .unwrap();

        let row = db
            .usage()
            .find_month(user.id, "2025-04")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.tokens_used, 350);
        assert_eq!(row.estimated_cost, Decimal::new(3, 4));
    }

    #[tokio::test]
    async fn test_usage_months_are_independent() {
        let db = memory_database().await;
        let user = db.users().create("u@example.com", "U").await.unwrap();

        db.usage()
            .record(user.id, "2025-03", 100, Decimal::ZERO)
            .await
            .unwrap();
        db.usage()
            .record(user.id, "2025-04", 200, Decimal::ZERO)
            .await
            .unwrap();

        assert_eq!(
            db.usage()
                .tokens_used_in_month(user.id, "2025-03")
                .await
                .unwrap(),
            100
        );
        assert_eq!(
            db.usage()
                .tokens_used_in_month(user.id, "2025-04")
                .await
                .unwrap(),
            200
        );
    }

    #[tokio::test]
    async fn test_usage_history_ascending() {
        let db = memory_database().await;
        let user = db.users().create("u@example.com", "U").await.unwrap();

        for (month, tokens) in [("2025-01", 10), ("2025-02", 20), ("2025-03", 30)] {
            db.usage()
                .record(user.id, month, tokens, Decimal::ZERO)
                .await
                .unwrap();
        }

        let history = db.usage().history(user.id, 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].month, "2025-02");
        assert_eq!(history[1].month, "2025-03");
    }

    #[tokio::test]
    async fn test_concurrent_usage_increments() {
        let db = Arc::new(memory_database().await);
        let user = db.users().create("u@example.com", "U").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.usage()
                    .record(user.id, "2025-05", 10, Decimal::ZERO)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            db.usage()
                .tokens_used_in_month(user.id, "2025-05")
                .await
                .unwrap(),
            100
        );
    }
}
