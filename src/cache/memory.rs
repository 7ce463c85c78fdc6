use super::{CacheBackend, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone)]
struct CacheEntry {
    data: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() > exp)
    }
}

/// In-process cache for single-instance deployments and tests.
#[derive(Clone, Default)]
pub struct MemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let expired = {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if entry.is_expired() => true,
                Some(entry) => return Ok(Some(entry.data.clone())),
                None => return Ok(None),
            }
        };

        if expired {
            self.store.write().await.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()))
        };

        let mut store = self.store.write().await;
        store.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<()> {
        Ok(())
    }
}
