use super::{CacheBackend, CacheError, CacheResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Redis-backed cache sharing one multiplexed connection, re-established
/// when a ping fails.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: Arc<Mutex<Option<redis::aio::MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCache {
    pub fn new(redis_url: &str, key_prefix: String) -> CacheResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Cache(format!("Redis client error: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
            key_prefix,
        })
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        let mut conn_guard = self.connection.lock().await;

        if let Some(conn) = conn_guard.take() {
            if Self::ping(&conn).await.is_ok() {
                return Ok(conn);
            }
        }

        self.client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| CacheError::Connection(format!("Connection failed: {}", e)))
    }

    async fn ping(conn: &redis::aio::MultiplexedConnection) -> Result<(), redis::RedisError> {
        let mut conn = conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn return_connection(&self, conn: redis::aio::MultiplexedConnection) {
        *self.connection.lock().await = Some(conn);
    }

    fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let result: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| CacheError::Cache(e.to_string()))?;

        self.return_connection(conn).await;

        match result {
            Some(data) => {
                let value = serde_json::from_str(&data)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let key = self.prefixed_key(key);
        let data =
            serde_json::to_string(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let mut conn = self.get_connection().await?;

        if ttl.is_zero() {
            let _: () = conn
                .set(&key, data)
                .await
                .map_err(|e| CacheError::Cache(e.to_string()))?;
        } else {
            let _: () = conn
                .set_ex(&key, data, ttl.as_secs())
                .await
                .map_err(|e| CacheError::Cache(e.to_string()))?;
        }

        self.return_connection(conn).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let key = self.prefixed_key(key);
        let mut conn = self.get_connection().await?;

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| CacheError::Cache(e.to_string()))?;

        self.return_connection(conn).await;
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Cache(format!("Ping failed: {}", e)))?;

        self.return_connection(conn).await;
        Ok(())
    }
}
