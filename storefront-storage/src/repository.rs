//! Async record store trait.
//!
//! The single seam between request handling and persistence. Lookups by id
//! return `Ok(None)` for missing rows; callers decide whether that is a
//! not-found error.

use async_trait::async_trait;
use storefront_core::{
    Customer, EntityId, NameFilter, NewCustomer, NewOrder, NewProduct, Order, Product, StoreResult,
};

/// Persistence operations for customers, orders and products.
///
/// Lists are returned in ascending id order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ========================================================================
    // CUSTOMER OPERATIONS
    // ========================================================================

    /// Get a customer, with its order summaries, by id.
    async fn customer_get(&self, id: EntityId) -> StoreResult<Option<Customer>>;

    /// List every customer.
    async fn customer_list(&self) -> StoreResult<Vec<Customer>>;

    /// List customers whose name satisfies `filter`.
    async fn customer_search(&self, filter: &NameFilter) -> StoreResult<Vec<Customer>>;

    /// Insert a customer and return it with its assigned id.
    async fn customer_create(&self, new: &NewCustomer) -> StoreResult<Customer>;

    // ========================================================================
    // ORDER OPERATIONS
    // ========================================================================

    async fn order_get(&self, id: EntityId) -> StoreResult<Option<Order>>;

    async fn order_list(&self) -> StoreResult<Vec<Order>>;

    /// Insert an order.
    ///
    /// Fails with `StorageError::NotFound` when the customer or any product
    /// does not exist. The order is linked to its customer and to every
    /// product in the same write.
    async fn order_create(&self, new: &NewOrder) -> StoreResult<Order>;

    // ========================================================================
    // PRODUCT OPERATIONS
    // ========================================================================

    async fn product_get(&self, id: EntityId) -> StoreResult<Option<Product>>;

    async fn product_list(&self) -> StoreResult<Vec<Product>>;

    /// Find a product whose trimmed description equals `description`,
    /// ignoring case.
    async fn product_find_by_description(&self, description: &str)
        -> StoreResult<Option<Product>>;

    async fn product_create(&self, new: &NewProduct) -> StoreResult<Product>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Cheap liveness probe against the backing store.
    async fn ping(&self) -> StoreResult<()>;
}
