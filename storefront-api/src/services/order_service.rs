//! Order Service

use storefront_core::{EntityId, EntityType, NewOrder, Order, StoreError, ValidationError};
use storefront_storage::{CacheKey, CacheRegion, InvalidationCoordinator, RecordStore, WriteOutcome};

use crate::error::{ApiError, ApiResult};
use crate::messages;
use crate::validation::Validate;

pub async fn get_order(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
    id: EntityId,
) -> ApiResult<Order> {
    coordinator
        .read_through(CacheRegion::Orders, CacheKey::Id(id), || async move {
            store.order_get(id).await.and_then(|found| {
                found.ok_or_else(|| StoreError::not_found(EntityType::Order, id))
            })
        })
        .await
        .map_err(ApiError::from)
}

pub async fn list_orders(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
) -> ApiResult<Vec<Order>> {
    coordinator
        .read_through(CacheRegion::AllOrders, CacheKey::All, || store.order_list())
        .await
        .map_err(ApiError::from)
}

/// Create an order for an existing customer and existing products.
///
/// # Errors
/// - Validation for non-positive ids
/// - Not found when the customer or any product does not exist
/// - Bad request (`order.product.size`) when no product is given; an
///   unknown customer is reported first
pub async fn create_order(
    store: &dyn RecordStore,
    coordinator: &InvalidationCoordinator,
    request: &NewOrder,
) -> ApiResult<WriteOutcome<Order>> {
    request.validate()?;
    if request.product_ids.is_empty() {
        if store.customer_get(request.customer_id).await?.is_none() {
            return Err(StoreError::not_found(EntityType::Customer, request.customer_id).into());
        }
        return Err(StoreError::from(ValidationError::ConstraintViolation {
            constraint: messages::ORDER_PRODUCT_SIZE.to_string(),
            reason: "At least one product is required".to_string(),
        })
        .into());
    }

    let order = store.order_create(request).await?;
    let side_effects = coordinator.on_order_created(&order).await;
    tracing::info!(
        order_id = order.id,
        customer_id = order.customer.id,
        products = order.products.len(),
        clean = side_effects.is_clean(),
        "Order created"
    );
    Ok(WriteOutcome::new(order, side_effects))
}
