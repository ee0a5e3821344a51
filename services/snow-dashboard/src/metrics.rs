//! Dashboard metrics collection and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;

/// Which figure a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Month,
    Daily,
}

impl RenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderKind::Month => "month",
            RenderKind::Daily => "daily",
        }
    }
}

/// Metrics collector for the dashboard.
///
/// Counters are mirrored into the `metrics` recorder so they also show up
/// in the Prometheus exporter when one is installed.
#[derive(Debug)]
pub struct DashboardMetrics {
    pub renders: AtomicU64,
    pub render_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    /// Sum of render times in microseconds
    render_time_us: AtomicU64,
    start_time: Instant,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardMetrics {
    pub fn new() -> Self {
        Self {
            renders: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            render_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_render(&self, kind: RenderKind, elapsed: Duration) {
        self.renders.fetch_add(1, Ordering::Relaxed);
        self.render_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        counter!("snowcast_renders_total", "kind" => kind.as_str()).increment(1);
        histogram!("snowcast_render_duration_ms", "kind" => kind.as_str())
            .record(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn record_render_error(&self, kind: RenderKind) {
        self.render_errors.fetch_add(1, Ordering::Relaxed);
        counter!("snowcast_render_errors_total", "kind" => kind.as_str()).increment(1);
    }

    pub fn record_cache_hit(&self, cache: &'static str) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("snowcast_cache_hits_total", "cache" => cache).increment(1);
    }

    pub fn record_cache_miss(&self, cache: &'static str) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        counter!("snowcast_cache_misses_total", "cache" => cache).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let renders = self.renders.load(Ordering::Relaxed);
        let total_us = self.render_time_us.load(Ordering::Relaxed);
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            renders,
            render_errors: self.render_errors.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            avg_render_ms: if renders == 0 {
                0.0
            } else {
                total_us as f64 / renders as f64 / 1000.0
            },
        }
    }
}

/// Point-in-time view of the collector.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub renders: u64,
    pub render_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub avg_render_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages_render_time() {
        let metrics = DashboardMetrics::new();
        metrics.record_render(RenderKind::Month, Duration::from_millis(10));
        metrics.record_render(RenderKind::Daily, Duration::from_millis(30));
        metrics.record_render_error(RenderKind::Daily);
        metrics.record_cache_hit("derived");
        metrics.record_cache_miss("image");
        metrics.record_cache_miss("image");

        let snap = metrics.snapshot();
        assert_eq!(snap.renders, 2);
        assert_eq!(snap.render_errors, 1);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 2);
        assert!((snap.avg_render_ms - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = DashboardMetrics::new().snapshot();
        assert_eq!(snap.renders, 0);
        assert_eq!(snap.avg_render_ms, 0.0);
    }
}
