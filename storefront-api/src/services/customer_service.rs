//! Customer Service

use storefront_core::{Customer, EntityId, EntityType, NewCustomer, PredicateBuilder, StoreError};
use storefront_storage::{CacheKey, CacheRegion, InvalidationCoordinator, RecordStore, WriteOutcome};

use crate::error::{ApiError, ApiResult};
use crate::types::CustomerSearchRequest;
use crate::validation::Validate;

/// Get one customer, served from `customers` when cached.
///
/// A missing customer is an error and is never cached.
pub async fn get_customer(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
    id: EntityId,
) -> ApiResult<Customer> {
    coordinator
        .read_through(CacheRegion::Customers, CacheKey::Id(id), || async move {
            store.customer_get(id).await.and_then(|found| {
                found.ok_or_else(|| StoreError::not_found(EntityType::Customer, id))
            })
        })
        .await
        .map_err(ApiError::from)
}

/// List every customer, served from `all_customers` when cached.
pub async fn list_customers(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
) -> ApiResult<Vec<Customer>> {
    coordinator
        .read_through(CacheRegion::AllCustomers, CacheKey::All, || store.customer_list())
        .await
        .map_err(ApiError::from)
}

/// Search customers by name. Results are never cached.
///
/// # Errors
/// Validation when the query is outside 2..=255 characters; bad request
/// when it has no terms and the empty-query policy is `Reject`.
pub async fn search_customers(
    store: &dyn RecordStore,
    predicates: &PredicateBuilder,
    request: &CustomerSearchRequest,
) -> ApiResult<Vec<Customer>> {
    request.validate()?;
    let filter = predicates
        .try_build(&request.name)
        .map_err(StoreError::from)?;
    tracing::debug!(
        terms = filter.tokens().len(),
        combinator = ?filter.combinator(),
        "Customer search"
    );
    Ok(store.customer_search(&filter).await?)
}

/// Create a customer, then evict the list regions and prime its entry.
pub async fn create_customer(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
    request: &NewCustomer,
) -> ApiResult<WriteOutcome<Customer>> {
    request.validate()?;
    let customer = store.customer_create(request).await?;
    let side_effects = coordinator.on_customer_created(&customer).await;
    tracing::info!(customer_id = customer.id, clean = side_effects.is_clean(), "Customer created");
    Ok(WriteOutcome::new(customer, side_effects))
}
