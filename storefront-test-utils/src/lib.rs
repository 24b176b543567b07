//! Storefront Test Utilities
//!
//! Shared test infrastructure for the Storefront workspace:
//! - Instrumented and failing record stores
//! - A cache backend that is always down, and an observer that records
//!   what the coordinator reports
//! - Proptest generators for payloads and search queries
//! - Seeded fixtures and assertions

pub use storefront_core::{
    Combinator, Customer, EmptyQueryPolicy, EntityId, EntityType, NameFilter, NewCustomer,
    NewOrder, NewProduct, Order, PredicateBuilder, Product, StorageError, StoreError, StoreResult,
    ValidationError,
};
pub use storefront_storage::{
    CacheBackend, CacheError, CacheKey, CacheRegion, CacheResult, CacheStats, CacheStore,
    InMemoryStore, InvalidationCoordinator, RecordStore, SideEffectAction, SideEffectFailure,
    SideEffectObserver,
};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

// ============================================================================
// COUNTING STORE
// ============================================================================

/// Record store wrapper that counts calls per operation before delegating.
///
/// Operation names are the [`RecordStore`] method names, e.g.
/// `"customer_get"`.
pub struct CountingStore {
    inner: Arc<dyn RecordStore>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Wrap a fresh [`InMemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn hit(&self, operation: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }
    }
}

impl std::fmt::Debug for CountingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingStore")
            .field("total", &self.total())
            .finish()
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn customer_get(&self, id: EntityId) -> StoreResult<Option<Customer>> {
        self.hit("customer_get");
        self.inner.customer_get(id).await
    }

    async fn customer_list(&self) -> StoreResult<Vec<Customer>> {
        self.hit("customer_list");
        self.inner.customer_list().await
    }

    async fn customer_search(&self, filter: &NameFilter) -> StoreResult<Vec<Customer>> {
        self.hit("customer_search");
        self.inner.customer_search(filter).await
    }

    async fn customer_create(&self, new: &NewCustomer) -> StoreResult<Customer> {
        self.hit("customer_create");
        self.inner.customer_create(new).await
    }

    async fn order_get(&self, id: EntityId) -> StoreResult<Option<Order>> {
        self.hit("order_get");
        self.inner.order_get(id).await
    }

    async fn order_list(&self) -> StoreResult<Vec<Order>> {
        self.hit("order_list");
        self.inner.order_list().await
    }

    async fn order_create(&self, new: &NewOrder) -> StoreResult<Order> {
        self.hit("order_create");
        self.inner.order_create(new).await
    }

    async fn product_get(&self, id: EntityId) -> StoreResult<Option<Product>> {
        self.hit("product_get");
        self.inner.product_get(id).await
    }

    async fn product_list(&self) -> StoreResult<Vec<Product>> {
        self.hit("product_list");
        self.inner.product_list().await
    }

    async fn product_find_by_description(
        &self,
        description: &str,
    ) -> StoreResult<Option<Product>> {
        self.hit("product_find_by_description");
        self.inner.product_find_by_description(description).await
    }

    async fn product_create(&self, new: &NewProduct) -> StoreResult<Product> {
        self.hit("product_create");
        self.inner.product_create(new).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.hit("ping");
        self.inner.ping().await
    }
}

// ============================================================================
// FAILING STORE
// ============================================================================

/// Record store whose every operation fails with a backend error.
#[derive(Debug, Clone)]
pub struct FailingStore {
    reason: String,
}

impl FailingStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> StoreResult<T> {
        Err(StoreError::backend(self.reason.clone()))
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("connection reset by peer")
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn customer_get(&self, _id: EntityId) -> StoreResult<Option<Customer>> {
        self.fail()
    }

    async fn customer_list(&self) -> StoreResult<Vec<Customer>> {
        self.fail()
    }

    async fn customer_search(&self, _filter: &NameFilter) -> StoreResult<Vec<Customer>> {
        self.fail()
    }

    async fn customer_create(&self, _new: &NewCustomer) -> StoreResult<Customer> {
        self.fail()
    }

    async fn order_get(&self, _id: EntityId) -> StoreResult<Option<Order>> {
        self.fail()
    }

    async fn order_list(&self) -> StoreResult<Vec<Order>> {
        self.fail()
    }

    async fn order_create(&self, _new: &NewOrder) -> StoreResult<Order> {
        self.fail()
    }

    async fn product_get(&self, _id: EntityId) -> StoreResult<Option<Product>> {
        self.fail()
    }

    async fn product_list(&self) -> StoreResult<Vec<Product>> {
        self.fail()
    }

    async fn product_find_by_description(
        &self,
        _description: &str,
    ) -> StoreResult<Option<Product>> {
        self.fail()
    }

    async fn product_create(&self, _new: &NewProduct) -> StoreResult<Product> {
        self.fail()
    }

    async fn ping(&self) -> StoreResult<()> {
        self.fail()
    }
}

// ============================================================================
// CACHE DOUBLES
// ============================================================================

/// Cache backend that is always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCacheBackend;

impl FailingCacheBackend {
    fn down(region: CacheRegion) -> CacheError {
        CacheError::Unavailable {
            region,
            reason: "cache node unreachable".to_string(),
        }
    }
}

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, region: CacheRegion, _key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        Err(Self::down(region))
    }

    async fn put_if_absent(
        &self,
        region: CacheRegion,
        _key: CacheKey,
        _value: Vec<u8>,
    ) -> CacheResult<Option<Vec<u8>>> {
        Err(Self::down(region))
    }

    async fn evict_one(&self, region: CacheRegion, _key: &CacheKey) -> CacheResult<bool> {
        Err(Self::down(region))
    }

    async fn evict_all(&self, region: CacheRegion) -> CacheResult<u64> {
        Err(Self::down(region))
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        Err(Self::down(CacheRegion::Customers))
    }
}

/// Observer that keeps every reported failure and lookup.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<SideEffectFailure>>,
    lookups: Mutex<Vec<(CacheRegion, bool)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<SideEffectFailure> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Actions of the recorded failures, in report order.
    pub fn actions(&self) -> Vec<SideEffectAction> {
        self.failures().iter().map(|f| f.action).collect()
    }

    pub fn lookups(&self) -> Vec<(CacheRegion, bool)> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn hits(&self, region: CacheRegion) -> usize {
        self.lookups()
            .iter()
            .filter(|(r, hit)| *r == region && *hit)
            .count()
    }

    pub fn misses(&self, region: CacheRegion) -> usize {
        self.lookups()
            .iter()
            .filter(|(r, hit)| *r == region && !*hit)
            .count()
    }
}

impl SideEffectObserver for RecordingObserver {
    fn on_failure(&self, failure: &SideEffectFailure) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure.clone());
        }
    }

    fn on_lookup(&self, region: CacheRegion, hit: bool) {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push((region, hit));
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Storefront payloads.

    use super::*;
    use proptest::prelude::*;

    // === Text ===

    /// A single search term: letters only, so it never contains whitespace.
    pub fn arb_term() -> impl Strategy<Value = String> {
        "[A-Za-z]{1,8}"
    }

    /// Customer name that passes create-time validation.
    pub fn arb_customer_name() -> impl Strategy<Value = String> {
        prop::collection::vec(arb_term(), 1..4).prop_map(|words| words.join(" "))
    }

    /// Product description that passes create-time validation.
    pub fn arb_description() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z ]{1,40}[A-Za-z]"
    }

    /// Free-text query with arbitrary runs of spaces and tabs between terms.
    pub fn arb_query() -> impl Strategy<Value = String> {
        prop::collection::vec((arb_term(), "[ \t]{1,3}"), 0..5).prop_map(|parts| {
            parts
                .into_iter()
                .map(|(term, gap)| format!("{}{}", term, gap))
                .collect::<String>()
        })
    }

    /// A query with no terms at all.
    pub fn arb_blank_query() -> impl Strategy<Value = String> {
        "[ \t\n]{0,6}"
    }

    // === Enums ===

    pub fn arb_combinator() -> impl Strategy<Value = Combinator> {
        prop_oneof![Just(Combinator::Any), Just(Combinator::All)]
    }

    pub fn arb_empty_query_policy() -> impl Strategy<Value = EmptyQueryPolicy> {
        prop_oneof![
            Just(EmptyQueryPolicy::MatchNothing),
            Just(EmptyQueryPolicy::MatchEverything),
            Just(EmptyQueryPolicy::Reject),
        ]
    }

    pub fn arb_cache_region() -> impl Strategy<Value = CacheRegion> {
        prop::sample::select(CacheRegion::ALL.to_vec())
    }

    // === Payloads ===

    pub fn arb_new_customer() -> impl Strategy<Value = NewCustomer> {
        arb_customer_name().prop_map(|name| NewCustomer { name })
    }

    pub fn arb_new_product() -> impl Strategy<Value = NewProduct> {
        arb_description().prop_map(|description| NewProduct { description })
    }

    /// Order for `customer_id` referencing a non-empty subset of `product_ids`.
    pub fn arb_new_order(
        customer_id: EntityId,
        product_ids: Vec<EntityId>,
    ) -> impl Strategy<Value = NewOrder> {
        let count = product_ids.len().max(1);
        (
            prop::option::of(arb_description()),
            prop::sample::subsequence(product_ids, 1..=count),
        )
            .prop_map(move |(description, product_ids)| NewOrder {
                description,
                customer_id,
                product_ids,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common scenarios.

    use super::*;

    pub const CUSTOMER_NAMES: [&str; 4] = ["John Smith", "Jane Smith", "John Doe", "Alice Brown"];
    pub const PRODUCT_DESCRIPTIONS: [&str; 3] = ["Desk", "Chair", "Lamp"];

    pub fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
        }
    }

    pub fn new_product(description: &str) -> NewProduct {
        NewProduct {
            description: description.to_string(),
        }
    }

    pub fn new_order(customer_id: EntityId, product_ids: &[EntityId]) -> NewOrder {
        NewOrder {
            description: Some(format!("order for customer {}", customer_id)),
            customer_id,
            product_ids: product_ids.to_vec(),
        }
    }

    /// Records written by [`seed`], in insertion order.
    #[derive(Debug, Clone)]
    pub struct Seeded {
        pub customers: Vec<Customer>,
        pub products: Vec<Product>,
        pub orders: Vec<Order>,
    }

    /// Write [`CUSTOMER_NAMES`] and [`PRODUCT_DESCRIPTIONS`], then one order
    /// for the first customer containing the first two products.
    pub async fn seed(store: &dyn RecordStore) -> StoreResult<Seeded> {
        let mut customers = Vec::with_capacity(CUSTOMER_NAMES.len());
        for name in CUSTOMER_NAMES {
            customers.push(store.customer_create(&new_customer(name)).await?);
        }

        let mut products = Vec::with_capacity(PRODUCT_DESCRIPTIONS.len());
        for description in PRODUCT_DESCRIPTIONS {
            products.push(store.product_create(&new_product(description)).await?);
        }

        let order = store
            .order_create(&new_order(
                customers[0].id,
                &[products[0].id, products[1].id],
            ))
            .await?;

        Ok(Seeded {
            customers,
            products,
            orders: vec![order],
        })
    }

    /// A fresh in-memory store with [`seed`] applied.
    pub async fn seeded_store() -> StoreResult<(Arc<InMemoryStore>, Seeded)> {
        let store = Arc::new(InMemoryStore::new());
        let seeded = seed(store.as_ref()).await?;
        Ok((store, seeded))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Storefront results.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &StoreResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a result is a NotFound storage error for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &StoreResult<T>, entity_type: EntityType) {
        match result {
            Err(StoreError::Storage(StorageError::NotFound {
                entity_type: et, ..
            })) => {
                assert_eq!(*et, entity_type, "NotFound for the wrong entity type");
            }
            other => panic!("Expected NotFound({}), got: {:?}", entity_type, other),
        }
    }

    /// Assert the names a filter selects from `names`, preserving order.
    #[track_caller]
    pub fn assert_selects(filter: &NameFilter, names: &[&str], expected: &[&str]) {
        let selected: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| filter.matches(name))
            .collect();
        assert_eq!(selected, expected, "filter {:?} selected the wrong names", filter);
    }

    /// Assert that the side-effect failures all come from one action.
    #[track_caller]
    pub fn assert_all_actions(failures: &[SideEffectFailure], action: SideEffectAction) {
        assert!(!failures.is_empty(), "Expected side-effect failures, got none");
        for failure in failures {
            assert_eq!(failure.action, action, "unexpected failure: {:?}", failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_counting_store_counts_per_operation() -> StoreResult<()> {
        let store = CountingStore::in_memory();
        store.customer_create(&fixtures::new_customer("Jo")).await?;
        store.customer_list().await?;
        store.customer_list().await?;

        assert_eq!(store.calls("customer_create"), 1);
        assert_eq!(store.calls("customer_list"), 2);
        assert_eq!(store.calls("order_get"), 0);
        assert_eq!(store.total(), 3);

        store.reset();
        assert_eq!(store.total(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failing_store_fails_everything() {
        let store = FailingStore::default();
        assert!(store.ping().await.is_err());
        assert!(store.customer_list().await.is_err());
        assert!(store.product_find_by_description("Desk").await.is_err());
    }

    #[tokio::test]
    async fn test_seeded_store_layout() -> StoreResult<()> {
        let (store, seeded) = fixtures::seeded_store().await?;
        assert_eq!(seeded.customers.len(), fixtures::CUSTOMER_NAMES.len());
        assert_eq!(seeded.products.len(), fixtures::PRODUCT_DESCRIPTIONS.len());
        assert_eq!(store.order_count(), 1);

        let owner = store.customer_get(seeded.customers[0].id).await?;
        assert_eq!(owner.map(|c| c.orders.len()), Some(1));

        assertions::assert_not_found(
            &store.order_create(&fixtures::new_order(999, &[1])).await,
            EntityType::Customer,
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_recording_observer_sees_failures() {
        let observer = RecordingObserver::new();
        let coordinator = InvalidationCoordinator::new(CacheStore::new(Arc::new(
            FailingCacheBackend,
        )))
        .with_observer(observer.clone());

        let customer = Customer {
            id: 1,
            name: "Jo".to_string(),
            orders: vec![],
        };
        let report = coordinator.on_customer_created(&customer).await;

        assert!(!report.is_clean());
        assert_eq!(observer.failures().len(), report.failures().len());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_names_are_not_blank(name in generators::arb_customer_name()) {
            prop_assert!(!name.trim().is_empty());
            prop_assert!(name.chars().count() <= 255);
        }

        #[test]
        fn prop_blank_queries_have_no_terms(query in generators::arb_blank_query()) {
            prop_assert!(storefront_core::tokenize(&query).is_empty());
        }

        #[test]
        fn prop_generated_orders_are_non_empty(
            order in generators::arb_new_order(1, vec![1, 2, 3, 4])
        ) {
            prop_assert!(!order.product_ids.is_empty());
            prop_assert!(order.product_ids.iter().all(|id| (1..=4).contains(id)));
        }
    }
}
