//! Write-time invalidation and read-through population.
//!
//! Cache work always runs after the domain write has committed. Failures
//! are logged at `warn`, handed to the [`SideEffectObserver`], and returned
//! as a [`SideEffectReport`]; they never change the result of the write.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use storefront_core::{Customer, Order};
use tracing::warn;

use super::error::CacheError;
use super::region::{CacheKey, CacheRegion};
use super::store::CacheStore;

// ============================================================================
// POLICY
// ============================================================================

/// Regions cleared when a customer is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CustomerEvictionScope {
    /// `all_customers`, `all_orders` and every entry in `orders`.
    #[default]
    Broad,
    /// `all_customers` only. A new customer has no orders, so order views
    /// cannot be stale.
    Narrow,
}

impl CustomerEvictionScope {
    fn regions(&self) -> &'static [CacheRegion] {
        match self {
            CustomerEvictionScope::Broad => &[
                CacheRegion::AllCustomers,
                CacheRegion::AllOrders,
                CacheRegion::Orders,
            ],
            CustomerEvictionScope::Narrow => &[CacheRegion::AllCustomers],
        }
    }
}

// ============================================================================
// SIDE-EFFECT REPORTING
// ============================================================================

/// The cache operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideEffectAction {
    EvictAll,
    EvictOne,
    Prime,
    Lookup,
    Populate,
}

impl SideEffectAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideEffectAction::EvictAll => "evict_all",
            SideEffectAction::EvictOne => "evict_one",
            SideEffectAction::Prime => "prime",
            SideEffectAction::Lookup => "lookup",
            SideEffectAction::Populate => "populate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub action: SideEffectAction,
    pub region: CacheRegion,
    pub key: Option<CacheKey>,
    pub error: CacheError,
}

/// Every cache failure swallowed while handling one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffectReport {
    failures: Vec<SideEffectFailure>,
}

impl SideEffectReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[SideEffectFailure] {
        &self.failures
    }

    fn push(&mut self, failure: SideEffectFailure) {
        self.failures.push(failure);
    }
}

/// Result of a write plus the best-effort cache work that followed it.
/// Only `value` is returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome<T> {
    pub value: T,
    pub side_effects: SideEffectReport,
}

impl<T> WriteOutcome<T> {
    pub fn new(value: T, side_effects: SideEffectReport) -> Self {
        Self {
            value,
            side_effects,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Receives cache events for metrics or tests.
pub trait SideEffectObserver: Send + Sync {
    fn on_failure(&self, failure: &SideEffectFailure);

    /// Called for every read-through lookup that reached the backend.
    fn on_lookup(&self, _region: CacheRegion, _hit: bool) {}
}

/// Observer that does nothing beyond the coordinator's own logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SideEffectObserver for NoopObserver {
    fn on_failure(&self, _failure: &SideEffectFailure) {}
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Knows which regions each write invalidates and which entry it primes.
#[derive(Clone)]
pub struct InvalidationCoordinator {
    store: CacheStore,
    customer_scope: CustomerEvictionScope,
    observer: Arc<dyn SideEffectObserver>,
}

impl std::fmt::Debug for InvalidationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationCoordinator")
            .field("store", &self.store)
            .field("customer_scope", &self.customer_scope)
            .finish_non_exhaustive()
    }
}

impl InvalidationCoordinator {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            customer_scope: CustomerEvictionScope::default(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_customer_scope(mut self, scope: CustomerEvictionScope) -> Self {
        self.customer_scope = scope;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SideEffectObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn customer_scope(&self) -> CustomerEvictionScope {
        self.customer_scope
    }

    /// Evict the list regions touched by a new customer, then prime
    /// `customers[customer.id]`.
    pub async fn on_customer_created(&self, customer: &Customer) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        for region in self.customer_scope.regions() {
            self.evict_region(*region, &mut report).await;
        }
        self.prime(CacheRegion::Customers, CacheKey::Id(customer.id), customer, &mut report)
            .await;
        report
    }

    /// Evict both list regions and the owning customer's entry (its order
    /// summaries changed), then prime `orders[order.id]`.
    pub async fn on_order_created(&self, order: &Order) -> SideEffectReport {
        let mut report = SideEffectReport::default();
        self.evict_region(CacheRegion::AllOrders, &mut report).await;
        self.evict_region(CacheRegion::AllCustomers, &mut report).await;

        let owner = CacheKey::Id(order.customer.id);
        if let Err(error) = self.store.evict_one(CacheRegion::Customers, &owner).await {
            self.record(
                &mut report,
                SideEffectAction::EvictOne,
                CacheRegion::Customers,
                Some(owner),
                error,
            );
        }

        self.prime(CacheRegion::Orders, CacheKey::Id(order.id), order, &mut report)
            .await;
        report
    }

    /// Cache-aside read.
    ///
    /// Returns the cached value when present. Otherwise calls `fetch`, whose
    /// error propagates unchanged and leaves the cache untouched, and stores
    /// the result with `put_if_absent`. When another writer got there first
    /// the stored value is returned, so concurrent readers agree. Cache
    /// failures degrade to the fetched value.
    ///
    /// Not linearizable with writes: when `fetch` completes before a
    /// concurrent write's eviction and the `put_if_absent` lands after it,
    /// the pre-write value is cached and served until the next write to
    /// the region evicts it again.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        region: CacheRegion,
        key: CacheKey,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let mut report = SideEffectReport::default();
        match self.store.get::<T>(region, &key).await {
            Ok(Some(cached)) => {
                self.observer.on_lookup(region, true);
                return Ok(cached);
            }
            Ok(None) => self.observer.on_lookup(region, false),
            Err(error) => {
                self.record(&mut report, SideEffectAction::Lookup, region, Some(key), error);
                return fetch().await;
            }
        }

        let fetched = fetch().await?;
        match self.store.put_if_absent(region, key, &fetched).await {
            Ok(Some(winner)) => Ok(winner),
            Ok(None) => Ok(fetched),
            Err(error) => {
                self.record(&mut report, SideEffectAction::Populate, region, Some(key), error);
                Ok(fetched)
            }
        }
    }

    async fn evict_region(&self, region: CacheRegion, report: &mut SideEffectReport) {
        if let Err(error) = self.store.evict_all(region).await {
            self.record(report, SideEffectAction::EvictAll, region, None, error);
        }
    }

    async fn prime<T>(
        &self,
        region: CacheRegion,
        key: CacheKey,
        value: &T,
        report: &mut SideEffectReport,
    ) where
        T: Serialize + DeserializeOwned + Sync,
    {
        if let Err(error) = self.store.put_if_absent(region, key, value).await {
            self.record(report, SideEffectAction::Prime, region, Some(key), error);
        }
    }

    fn record(
        &self,
        report: &mut SideEffectReport,
        action: SideEffectAction,
        region: CacheRegion,
        key: Option<CacheKey>,
        error: CacheError,
    ) {
        warn!(
            region = region.name(),
            action = action.as_str(),
            key = ?key,
            error = %error,
            "Cache side effect failed"
        );
        let failure = SideEffectFailure {
            action,
            region,
            key,
            error,
        };
        self.observer.on_failure(&failure);
        report.push(failure);
    }
}
