//! Tracing Subscriber Initialization

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "storefront_api=debug,storefront_storage=debug,tower_http=debug,info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Logging configuration from environment variables.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Environment (production, staging, development)
    pub environment: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("STOREFRONT_SERVICE_NAME")
                .unwrap_or_else(|_| "storefront-api".to_string()),
            environment: std::env::var("STOREFRONT_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            format: std::env::var("STOREFRONT_LOG_FORMAT")
                .map(|s| {
                    if s.eq_ignore_ascii_case("pretty") {
                        LogFormat::Pretty
                    } else {
                        LogFormat::Json
                    }
                })
                .unwrap_or_default(),
        }
    }
}

/// Install the global subscriber. Call once at startup; `RUST_LOG`
/// overrides the default filter.
pub fn init_tracing(config: &LoggingConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| ApiError::internal(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        environment = config.environment,
        "Tracing initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_second_init_is_error_not_panic() {
        let config = LoggingConfig {
            service_name: "test".into(),
            environment: "test".into(),
            format: LogFormat::Pretty,
        };
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
