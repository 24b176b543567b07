//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use storefront_core::PredicateBuilder;
use storefront_storage::{CacheStore, InvalidationCoordinator, RecordStore};

use crate::config::ApiConfig;
use crate::error::{ApiResult, ErrorClassifier};
use crate::messages::MessageCatalog;
use crate::telemetry::MetricsObserver;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Record store (in-memory or PostgreSQL).
    pub store: Arc<dyn RecordStore>,
    /// Region cache plus the knowledge of which writes clear which regions.
    pub coordinator: InvalidationCoordinator,
    /// Search policy for `POST /customer/search`.
    pub predicates: PredicateBuilder,
    /// Renders failures with the configured locale.
    pub classifier: ErrorClassifier,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        coordinator: InvalidationCoordinator,
        predicates: PredicateBuilder,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            store,
            coordinator,
            predicates,
            classifier,
            start_time: Instant::now(),
        }
    }

    /// In-memory cache, default policies and the English catalog.
    pub fn with_defaults(store: Arc<dyn RecordStore>) -> Self {
        Self::new(
            store,
            InvalidationCoordinator::new(CacheStore::in_memory()),
            PredicateBuilder::default(),
            ErrorClassifier::default(),
        )
    }

    /// Build state from configuration. The cache always starts empty and
    /// reports its events to the Prometheus observer.
    pub fn from_config(store: Arc<dyn RecordStore>, config: &ApiConfig) -> ApiResult<Self> {
        let coordinator = InvalidationCoordinator::new(CacheStore::in_memory())
            .with_customer_scope(config.customer_eviction)
            .with_observer(Arc::new(MetricsObserver));

        let predicates = PredicateBuilder::new(config.search_combinator, config.search_empty_query);

        let catalog = match &config.messages_file {
            Some(path) => MessageCatalog::default().with_file(path)?,
            None => MessageCatalog::default(),
        };
        tracing::debug!(locales = ?catalog.locales(), locale = %config.locale, "Message catalog loaded");
        let classifier = ErrorClassifier::new(Arc::new(catalog), config.locale.clone());

        Ok(Self::new(store, coordinator, predicates, classifier))
    }
}

crate::impl_from_ref!(Arc<dyn RecordStore>, store);
crate::impl_from_ref!(InvalidationCoordinator, coordinator);
crate::impl_from_ref!(PredicateBuilder, predicates);
crate::impl_from_ref!(ErrorClassifier, classifier);
crate::impl_from_ref!(Instant, start_time);
