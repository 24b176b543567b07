//! Storefront Telemetry - Logging and Metrics
//!
//! Structured `tracing` output and Prometheus metrics for the API layer,
//! including counters fed by the cache coordinator's side-effect observer.

pub mod logging;
pub mod metrics;
pub mod middleware;

pub use logging::{init_tracing, LogFormat, LoggingConfig};
pub use metrics::{metrics_handler, MetricsObserver, StorefrontMetrics, METRICS};
pub use middleware::observability_middleware;
