use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::healthy()
        }
    }

    pub fn degraded(message: String) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn degraded_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::degraded(message)
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// A component that can report its own health (database, cache, provider).
#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> HealthCheckResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheckResult>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_checks: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub unhealthy_count: usize,
    pub total_duration_ms: u64,
}

/// Registry of health checkers; the `/health` route drives it.
pub struct HealthService {
    checkers: Arc<RwLock<HashMap<String, Arc<dyn HealthChecker>>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            checkers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        let mut checkers = self.checkers.write().await;
        checkers.insert(name, checker);
    }

    /// Run all checks (`filter = Some("all")`), one named check, or none
    /// (basic liveness only).
    pub async fn check_health(&self, filter: Option<&str>) -> OverallHealthResponse {
        let checkers = self.checkers.read().await;
        let mut results = HashMap::new();
        let mut total_duration = 0u64;

        let checks_to_run: Vec<_> = match filter {
            Some("all") => checkers.iter().collect(),
            Some(specific) => checkers
                .iter()
                .filter(|(name, _)| name.as_str() == specific)
                .collect(),
            None => vec![],
        };

        for (name, checker) in checks_to_run {
            let start = Instant::now();
            let mut result = checker.check().await;
            let duration = start.elapsed().as_millis() as u64;
            result = result.with_duration(duration);
            total_duration += duration;
            results.insert(name.clone(), result);
        }

        let healthy_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Healthy))
            .count();
        let degraded_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Degraded))
            .count();
        let unhealthy_count = results
            .values()
            .filter(|r| matches!(r.status, HealthStatus::Unhealthy))
            .count();

        let overall_status = if unhealthy_count > 0 {
            HealthStatus::Unhealthy
        } else if degraded_count > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let summary = HealthSummary {
            total_checks: results.len(),
            healthy_count,
            degraded_count,
            unhealthy_count,
            total_duration_ms: total_duration,
        };

        OverallHealthResponse {
            status: overall_status,
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: results,
            summary,
        }
    }

    pub async fn registered_checkers(&self) -> Vec<String> {
        let checkers = self.checkers.read().await;
        checkers.keys().cloned().collect()
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChecker {
        name: &'static str,
        result: fn() -> HealthCheckResult,
    }

    #[async_trait]
    impl HealthChecker for FixedChecker {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> HealthCheckResult {
            (self.result)()
        }
    }

    #[tokio::test]
    async fn test_empty_service_is_healthy() {
        let service = HealthService::new();
        let response = service.check_health(None).await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert!(response.checks.is_empty());
    }

    #[tokio::test]
    async fn test_worst_status_wins() {
        let service = HealthService::new();
        service
            .register(Arc::new(FixedChecker {
                name: "ok",
                result: HealthCheckResult::healthy,
            }))
            .await;
        service
            .register(Arc::new(FixedChecker {
                name: "slow",
                result: || HealthCheckResult::degraded("laggy".to_string()),
            }))
            .await;
        service
            .register(Arc::new(FixedChecker {
                name: "down",
                result: || HealthCheckResult::unhealthy("gone".to_string()),
            }))
            .await;

        let response = service.check_health(Some("all")).await;
        assert!(matches!(response.status, HealthStatus::Unhealthy));
        assert_eq!(response.summary.total_checks, 3);
        assert_eq!(response.summary.healthy_count, 1);
        assert_eq!(response.summary.degraded_count, 1);
        assert_eq!(response.summary.unhealthy_count, 1);
    }

    #[tokio::test]
    async fn test_specific_check_filter() {
        let service = HealthService::new();
        service
            .register(Arc::new(FixedChecker {
                name: "database",
                result: HealthCheckResult::healthy,
            }))
            .await;
        service
            .register(Arc::new(FixedChecker {
                name: "cache",
                result: || HealthCheckResult::unhealthy("unreachable".to_string()),
            }))
            .await;

        let response = service.check_health(Some("database")).await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert_eq!(response.summary.total_checks, 1);
        assert!(response.checks.contains_key("database"));
        assert!(!response.checks.contains_key("cache"));
    }
}
