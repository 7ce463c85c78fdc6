use super::{CacheBackend, CacheResult};
use crate::config::ResponseCacheConfig;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Caches full assistant response payloads keyed by what the model actually
/// saw: the augmented prompt, the persona, and the trimmed history. Callers
/// must skip it entirely when grounding context was injected, since cached
/// answers framed around stale data would otherwise survive a dataset edit.
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    enabled: bool,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &ResponseCacheConfig) -> Self {
        Self {
            backend,
            enabled: config.enabled,
            ttl: Duration::from_secs(config.ttl_seconds),
        }
    }

    fn active(&self) -> bool {
        self.enabled && !self.ttl.is_zero()
    }

    /// Stable key over (augmented prompt, persona, serialized history).
    pub fn key(augmented_prompt: &str, persona: &str, history: &[Value]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(augmented_prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(persona.as_bytes());
        hasher.update([0u8]);
        if let Ok(serialized) = serde_json::to_string(history) {
            hasher.update(serialized.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.active() {
            return None;
        }
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("response cache read failed: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, payload: Value) -> CacheResult<()> {
        if !self.active() {
            return Ok(());
        }
        self.backend.put(key, payload, self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryCache;
    use serde_json::json;

    fn cache(enabled: bool, ttl_seconds: u64) -> ResponseCache {
        ResponseCache::new(
            Arc::new(MemoryCache::new()),
            &ResponseCacheConfig {
                enabled,
                ttl_seconds,
            },
        )
    }

    #[test]
    fn test_key_is_stable_and_sensitive() {
        let history = vec![json!({"role": "user", "content": "earlier"})];
        let a = ResponseCache::key("prompt", "general", &history);
        let b = ResponseCache::key("prompt", "general", &history);
        assert_eq!(a, b);

        assert_ne!(a, ResponseCache::key("prompt2", "general", &history));
        assert_ne!(a, ResponseCache::key("prompt", "sales", &history));
        assert_ne!(a, ResponseCache::key("prompt", "general", &[]));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = cache(true, 60);
        let key = ResponseCache::key("p", "general", &[]);
        cache.put(&key, json!({"reply": "hi"})).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap()["reply"], "hi");
    }

    #[tokio::test]
    async fn test_disabled_is_always_miss() {
        let cache = cache(false, 60);
        let key = ResponseCache::key("p", "general", &[]);
        cache.put(&key, json!({"reply": "hi"})).await.unwrap();
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_always_miss() {
        let cache = cache(true, 0);
        let key = ResponseCache::key("p", "general", &[]);
        cache.put(&key, json!({"reply": "hi"})).await.unwrap();
        assert!(cache.get(&key).await.is_none());
    }
}
