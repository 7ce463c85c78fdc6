pub mod memory;
pub mod redis;
pub mod response;

use crate::config::CacheConfig;
use crate::health::{HealthCheckResult, HealthChecker};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store for JSON payloads with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn health_check(&self) -> CacheResult<()>;
}

/// Build the configured backend ("memory" or "redis").
pub fn new_from_config(config: &CacheConfig) -> CacheResult<Arc<dyn CacheBackend>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(memory::MemoryCache::new())),
        "redis" => Ok(Arc::new(redis::RedisCache::new(
            &config.redis_url,
            config.key_prefix.clone(),
        )?)),
        other => Err(CacheError::Cache(format!(
            "unknown cache backend: {}",
            other
        ))),
    }
}

pub struct CacheHealthChecker {
    backend: Arc<dyn CacheBackend>,
}

impl CacheHealthChecker {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl HealthChecker for CacheHealthChecker {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthCheckResult {
        match self.backend.health_check().await {
            Ok(()) => HealthCheckResult::healthy(),
            Err(e) => HealthCheckResult::unhealthy(e.to_string()),
        }
    }
}
