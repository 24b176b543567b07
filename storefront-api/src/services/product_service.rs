//! Product Service
//!
//! Products are not cached; every read goes to the store.

use storefront_core::{EntityId, EntityType, NewProduct, Product, StorageError, StoreError};
use storefront_storage::RecordStore;

use crate::error::ApiResult;
use crate::validation::Validate;

pub async fn list_products(store: &dyn RecordStore) -> ApiResult<Vec<Product>> {
    Ok(store.product_list().await?)
}

pub async fn get_product(store: &dyn RecordStore, id: EntityId) -> ApiResult<Product> {
    store
        .product_get(id)
        .await?
        .ok_or_else(|| StoreError::not_found(EntityType::Product, id).into())
}

/// Create a product unless one with the same description exists, ignoring
/// case and surrounding whitespace.
pub async fn create_product(store: &dyn RecordStore, request: &NewProduct) -> ApiResult<Product> {
    request.validate()?;
    if let Some(existing) = store
        .product_find_by_description(request.description.trim())
        .await?
    {
        tracing::debug!(existing_id = existing.id, "Duplicate product description");
        return Err(StoreError::from(StorageError::Duplicate {
            entity_type: EntityType::Product,
            value: request.description.clone(),
        })
        .into());
    }
    let product = store.product_create(request).await?;
    tracing::info!(product_id = product.id, "Product created");
    Ok(product)
}
