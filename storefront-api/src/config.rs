//! API Configuration Module
//!
//! CORS, storage selection, search policy, cache policy and message
//! localization. Configuration is loaded from environment variables with
//! sensible defaults for development.

use std::path::PathBuf;

use storefront_core::{Combinator, EmptyQueryPolicy};
use storefront_storage::CustomerEvictionScope;

use crate::error::{ApiError, ApiResult};
use crate::messages::DEFAULT_LOCALE;

// ============================================================================
// STORAGE SELECTION
// ============================================================================

/// Which record store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
    Postgres,
}

impl StorageKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Some(StorageKind::Memory),
            "postgres" | "postgresql" | "pg" => Some(StorageKind::Postgres),
            _ => None,
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Storage and Policies
    // ========================================================================
    pub storage: StorageKind,

    /// How search terms combine. OR unless configured otherwise.
    pub search_combinator: Combinator,

    pub search_empty_query: EmptyQueryPolicy,

    /// Which regions a customer creation clears.
    pub customer_eviction: CustomerEvictionScope,

    // ========================================================================
    // Messages
    // ========================================================================
    pub locale: String,

    /// Optional TOML file with extra message bundles.
    pub messages_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours

            storage: StorageKind::default(),
            search_combinator: Combinator::default(),
            search_empty_query: EmptyQueryPolicy::default(),
            customer_eviction: CustomerEvictionScope::default(),

            locale: DEFAULT_LOCALE.to_string(),
            messages_file: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `STOREFRONT_CORS_ORIGINS`: comma-separated origins (default: allow all)
    /// - `STOREFRONT_CORS_ALLOW_CREDENTIALS`: `true` to allow credentials
    /// - `STOREFRONT_CORS_MAX_AGE_SECS`: preflight cache (default: 86400)
    /// - `STOREFRONT_STORAGE`: `memory` (default) or `postgres`
    /// - `STOREFRONT_SEARCH_COMBINATOR`: `any` (default) or `all`
    /// - `STOREFRONT_SEARCH_EMPTY_QUERY`: `nothing` (default), `everything` or `reject`
    /// - `STOREFRONT_CACHE_CUSTOMER_EVICTION`: `broad` (default) or `narrow`
    /// - `STOREFRONT_LOCALE`: message locale (default: `en`)
    /// - `STOREFRONT_MESSAGES_FILE`: TOML message bundle path
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    /// Unparseable values fall back to the default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = lookup("STOREFRONT_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("STOREFRONT_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = lookup("STOREFRONT_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let storage = parsed(&lookup, "STOREFRONT_STORAGE", StorageKind::parse)
            .unwrap_or(defaults.storage);

        let search_combinator =
            parsed(&lookup, "STOREFRONT_SEARCH_COMBINATOR", parse_combinator)
                .unwrap_or(defaults.search_combinator);

        let search_empty_query =
            parsed(&lookup, "STOREFRONT_SEARCH_EMPTY_QUERY", parse_empty_query)
                .unwrap_or(defaults.search_empty_query);

        let customer_eviction =
            parsed(&lookup, "STOREFRONT_CACHE_CUSTOMER_EVICTION", parse_eviction)
                .unwrap_or(defaults.customer_eviction);

        let locale = lookup("STOREFRONT_LOCALE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.locale);

        let messages_file = lookup("STOREFRONT_MESSAGES_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            storage,
            search_combinator,
            search_empty_query,
            customer_eviction,
            locale,
            messages_file,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }

    /// Production deployments must pin their CORS origins.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.cors_origins.is_empty() {
            return Err(ApiError::internal(
                "STOREFRONT_CORS_ORIGINS must be set in production",
            ));
        }
        Ok(())
    }
}

/// True when `STOREFRONT_ENVIRONMENT` (or `ENVIRONMENT`) is `production`.
pub fn is_production_environment() -> bool {
    std::env::var("STOREFRONT_ENVIRONMENT")
        .or_else(|_| std::env::var("ENVIRONMENT"))
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

fn parsed<F, T>(lookup: &F, key: &str, parse: fn(&str) -> Option<T>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let value = parse(&raw);
    if value.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unrecognized configuration value");
    }
    value
}

pub fn parse_combinator(s: &str) -> Option<Combinator> {
    match s.trim().to_lowercase().as_str() {
        "any" | "or" => Some(Combinator::Any),
        "all" | "and" => Some(Combinator::All),
        _ => None,
    }
}

pub fn parse_empty_query(s: &str) -> Option<EmptyQueryPolicy> {
    match s.trim().to_lowercase().as_str() {
        "nothing" | "match_nothing" => Some(EmptyQueryPolicy::MatchNothing),
        "everything" | "match_everything" => Some(EmptyQueryPolicy::MatchEverything),
        "reject" => Some(EmptyQueryPolicy::Reject),
        _ => None,
    }
}

pub fn parse_eviction(s: &str) -> Option<CustomerEvictionScope> {
    match s.trim().to_lowercase().as_str() {
        "broad" => Some(CustomerEvictionScope::Broad),
        "narrow" => Some(CustomerEvictionScope::Narrow),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.search_combinator, Combinator::Any);
        assert_eq!(config.search_empty_query, EmptyQueryPolicy::MatchNothing);
        assert_eq!(config.customer_eviction, CustomerEvictionScope::Broad);
        assert_eq!(config.locale, "en");
        assert!(config.messages_file.is_none());
    }

    #[test]
    fn test_from_lookup_reads_every_setting() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_CORS_ORIGINS", "https://shop.example, https://admin.example,"),
            ("STOREFRONT_CORS_MAX_AGE_SECS", "600"),
            ("STOREFRONT_STORAGE", "postgres"),
            ("STOREFRONT_SEARCH_COMBINATOR", "all"),
            ("STOREFRONT_SEARCH_EMPTY_QUERY", "reject"),
            ("STOREFRONT_CACHE_CUSTOMER_EVICTION", "narrow"),
            ("STOREFRONT_LOCALE", "fr"),
            ("STOREFRONT_MESSAGES_FILE", "/etc/storefront/messages.toml"),
        ]));

        assert_eq!(
            config.cors_origins,
            vec!["https://shop.example", "https://admin.example"]
        );
        assert_eq!(config.cors_max_age_secs, 600);
        assert_eq!(config.storage, StorageKind::Postgres);
        assert_eq!(config.search_combinator, Combinator::All);
        assert_eq!(config.search_empty_query, EmptyQueryPolicy::Reject);
        assert_eq!(config.customer_eviction, CustomerEvictionScope::Narrow);
        assert_eq!(config.locale, "fr");
        assert_eq!(
            config.messages_file,
            Some(PathBuf::from("/etc/storefront/messages.toml"))
        );
    }

    #[test]
    fn test_unrecognized_values_fall_back() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_STORAGE", "mongodb"),
            ("STOREFRONT_SEARCH_COMBINATOR", "xor"),
            ("STOREFRONT_CORS_MAX_AGE_SECS", "soon"),
        ]));
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.search_combinator, Combinator::Any);
        assert_eq!(config.cors_max_age_secs, 86400);
    }

    #[test]
    fn test_production_requires_origins() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());
        assert!(config.validate_for_production().is_err());

        config.cors_origins = vec!["https://shop.example".to_string()];
        assert!(config.is_production());
        assert!(config.validate_for_production().is_ok());
        assert!(config.is_origin_allowed("https://shop.example"));
        assert!(!config.is_origin_allowed("https://evil.example"));
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }
}
