//! Metrics collection for access control checks

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Access control metrics
#[derive(Debug, Clone, Default)]
pub struct AccessControlMetrics {
    /// Total number of checks
    pub total_checks: u64,

    /// Number of allowed checks
    pub allowed: u64,

    /// Number of denied checks (errors included)
    pub denied: u64,

    /// Checks that failed with an error
    pub errors: u64,

    /// Scope resolution passes
    pub resolutions: u64,

    /// Average scope resolution latency
    pub avg_resolution_ms: f64,
}

impl AccessControlMetrics {
    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            self.allowed as f64 / self.total_checks as f64
        }
    }
}

/// Metrics collector
pub struct MetricsCollector {
    metrics: Arc<RwLock<AccessControlMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(AccessControlMetrics::default())),
        }
    }

    /// Record a check outcome
    pub async fn record_check(&self, allowed: bool) {
        let mut metrics = self.metrics.write().await;
        metrics.total_checks += 1;

        if allowed {
            metrics.allowed += 1;
        } else {
            metrics.denied += 1;
        }
    }

    /// Record a check that failed with an error
    pub async fn record_error(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.total_checks += 1;
        metrics.denied += 1;
        metrics.errors += 1;
    }

    /// Record scope resolution latency
    pub async fn record_resolution(&self, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;

        let mut metrics = self.metrics.write().await;
        metrics.resolutions += 1;

        let n = metrics.resolutions as f64;
        metrics.avg_resolution_ms += (latency_ms - metrics.avg_resolution_ms) / n;
    }

    /// Snapshot of the current metrics
    pub async fn get_metrics(&self) -> AccessControlMetrics {
        self.metrics.read().await.clone()
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        *self.metrics.write().await = AccessControlMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
