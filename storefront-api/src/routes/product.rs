//! Product REST API Routes
//!
//! Products are read straight from the store; none of these handlers touch
//! the region cache.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use storefront_core::{NewProduct, Product};
use storefront_storage::RecordStore;

use crate::error::{ApiResult, ProblemDetail};
use crate::extractors::{PositiveId, ValidJson};
use crate::services;
use crate::state::AppState;

/// GET /products - List all products
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
    ),
)]
pub async fn list_products(
    State(store): State<Arc<dyn RecordStore>>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(services::list_products(store.as_ref()).await?))
}

/// GET /products/{id} - Get a product by id
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    params(("id" = i64, Path, description = "Product id, greater than 0")),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, description = "Invalid id", body = ProblemDetail),
        (status = 404, description = "Product not found", body = ProblemDetail),
    ),
)]
pub async fn get_product(
    State(store): State<Arc<dyn RecordStore>>,
    PositiveId(id): PositiveId,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(services::get_product(store.as_ref(), id).await?))
}

/// POST /products - Create a product
#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    request_body = NewProduct,
    responses(
        (status = 200, description = "Product created", body = Product),
        (status = 400, description = "Invalid input or duplicate description", body = ProblemDetail),
    ),
)]
pub async fn create_product(
    State(store): State<Arc<dyn RecordStore>>,
    ValidJson(req): ValidJson<NewProduct>,
) -> ApiResult<impl IntoResponse> {
    let product = services::create_product(store.as_ref(), &req).await?;
    Ok(Json(product))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product))
        .with_state(state)
}
