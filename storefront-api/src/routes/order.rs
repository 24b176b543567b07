//! Order REST API Routes

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use storefront_core::{NewOrder, Order};
use storefront_storage::{InvalidationCoordinator, RecordStore};

use crate::error::{ApiResult, ProblemDetail};
use crate::extractors::{PositiveId, ValidJson};
use crate::services;
use crate::state::AppState;

/// GET /order - List all orders
#[utoipa::path(
    get,
    path = "/order",
    tag = "Orders",
    responses(
        (status = 200, description = "All orders", body = Vec<Order>),
        (status = 500, description = "Internal error", body = ProblemDetail),
    ),
)]
pub async fn list_orders(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
) -> ApiResult<impl IntoResponse> {
    let orders = services::list_orders(store.as_ref(), &coordinator).await?;
    Ok(Json(orders))
}

/// GET /order/{id} - Get an order by id
#[utoipa::path(
    get,
    path = "/order/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id, greater than 0")),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 400, description = "Invalid id", body = ProblemDetail),
        (status = 404, description = "Order not found", body = ProblemDetail),
    ),
)]
pub async fn get_order(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
    PositiveId(id): PositiveId,
) -> ApiResult<impl IntoResponse> {
    let order = services::get_order(store.as_ref(), &coordinator, id).await?;
    Ok(Json(order))
}

/// POST /order - Create an order
#[utoipa::path(
    post,
    path = "/order",
    tag = "Orders",
    request_body = NewOrder,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid input or no products", body = ProblemDetail),
        (status = 404, description = "Customer or product not found", body = ProblemDetail),
    ),
)]
pub async fn create_order(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
    ValidJson(req): ValidJson<NewOrder>,
) -> ApiResult<impl IntoResponse> {
    let outcome = services::create_order(store.as_ref(), &coordinator, &req).await?;
    Ok((StatusCode::CREATED, Json(outcome.into_value())))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .with_state(state)
}
