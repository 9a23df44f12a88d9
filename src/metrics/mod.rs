//! Prometheus metrics for surfe-diem
//!
//! This module provides metrics tracking for:
//! - Upstream providers: requests per source and outcome
//! - Forecast cache: hits and misses per namespace
//! - Batch endpoint: per-item outcomes and request duration
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct ServiceMetrics {
    upstream_requests: CounterVec,
    cache_lookups: CounterVec,
    batch_items: CounterVec,
    batch_duration: Histogram,
}

static SERVICE_METRICS: OnceLock<ServiceMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Call once at startup. If registration fails the error is returned and
/// every recording function below stays a no-op.
///
/// ```ignore
/// if let Err(e) = surfe_diem::metrics::init_metrics() {
///     tracing::warn!("Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ServiceMetrics {
        upstream_requests: register_counter_vec!(
            "surfe_upstream_requests_total",
            "Total upstream provider requests by source and outcome",
            &["source", "outcome"]
        )?,
        cache_lookups: register_counter_vec!(
            "surfe_cache_lookups_total",
            "Total forecast cache lookups by namespace and result",
            &["namespace", "result"]
        )?,
        batch_items: register_counter_vec!(
            "surfe_batch_items_total",
            "Total batch-forecast items by type and outcome",
            &["type", "outcome"]
        )?,
        batch_duration: register_histogram!(
            "surfe_batch_duration_seconds",
            "Batch-forecast request duration in seconds",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        )?,
    };

    SERVICE_METRICS
        .set(metrics)
        .map_err(|_| "Service metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    SERVICE_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record one upstream request; `outcome` is `ok`, `error` or `timeout`
pub fn record_upstream_request(source: &str, outcome: &str) {
    if let Some(m) = SERVICE_METRICS.get() {
        m.upstream_requests
            .with_label_values(&[source, outcome])
            .inc();
    }
}

/// Record a cache lookup
pub fn record_cache_lookup(namespace: &str, hit: bool) {
    if let Some(m) = SERVICE_METRICS.get() {
        let result = if hit { "hit" } else { "miss" };
        m.cache_lookups
            .with_label_values(&[namespace, result])
            .inc();
    }
}

/// Record batch item outcomes for one item type (`buoy` or `spot`)
pub fn record_batch_items(kind: &str, resolved: usize, errors: usize) {
    let Some(m) = SERVICE_METRICS.get() else {
        return;
    };

    if resolved > 0 {
        m.batch_items
            .with_label_values(&[kind, "resolved"])
            .inc_by(resolved as f64);
    }
    if errors > 0 {
        m.batch_items
            .with_label_values(&[kind, "error"])
            .inc_by(errors as f64);
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a batch-forecast timer
pub fn start_batch_timer() -> MetricsTimer {
    match SERVICE_METRICS.get() {
        Some(m) => MetricsTimer::new(m.batch_duration.start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
