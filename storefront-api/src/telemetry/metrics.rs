//! Prometheus Metrics Definitions
//!
//! Defines the storefront metrics and exposes a /metrics endpoint for
//! Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use storefront_storage::{CacheRegion, SideEffectFailure, SideEffectObserver};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<StorefrontMetrics>> = Lazy::new(StorefrontMetrics::new);

#[derive(Clone)]
pub struct StorefrontMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Cache operation counter - labels: region, operation, outcome
    pub cache_operations_total: CounterVec,

    /// Swallowed cache failures - labels: region, action
    pub cache_side_effect_failures_total: CounterVec,
}

impl StorefrontMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "storefront_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "storefront_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            cache_operations_total: register_counter_vec!(
                "storefront_cache_operations_total",
                "Cache operations by region and outcome",
                &["region", "operation", "outcome"]
            )
            .map_err(|e| registration_error("cache_operations_total", e))?,

            cache_side_effect_failures_total: register_counter_vec!(
                "storefront_cache_side_effect_failures_total",
                "Cache failures swallowed after a successful write or read",
                &["region", "action"]
            )
            .map_err(|e| registration_error("cache_side_effect_failures_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, region: CacheRegion, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_operations_total
            .with_label_values(&[region.name(), "lookup", outcome])
            .inc();
    }

    pub fn record_side_effect_failure(&self, failure: &SideEffectFailure) {
        let region = failure.region.name();
        let action = failure.action.as_str();
        self.cache_operations_total
            .with_label_values(&[region, action, "error"])
            .inc();
        self.cache_side_effect_failures_total
            .with_label_values(&[region, action])
            .inc();
    }
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal(format!("Failed to register {}: {}", name, err))
}

// ============================================================================
// CACHE OBSERVER
// ============================================================================

/// Feeds coordinator events into the global metrics. Registration
/// failures were already logged at startup, so events are dropped quietly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl SideEffectObserver for MetricsObserver {
    fn on_failure(&self, failure: &SideEffectFailure) {
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_side_effect_failure(failure);
        }
    }

    fn on_lookup(&self, region: CacheRegion, hit: bool) {
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_cache_lookup(region, hit);
        }
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
