//! Customer REST API Routes

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use storefront_core::{Customer, NewCustomer, PredicateBuilder};
use storefront_storage::{InvalidationCoordinator, RecordStore};

use crate::error::{ApiResult, ProblemDetail};
use crate::extractors::{PositiveId, ValidJson};
use crate::services;
use crate::state::AppState;
use crate::types::CustomerSearchRequest;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /customer - List all customers
#[utoipa::path(
    get,
    path = "/customer",
    tag = "Customers",
    responses(
        (status = 200, description = "All customers", body = Vec<Customer>),
        (status = 500, description = "Internal error", body = ProblemDetail),
    ),
)]
pub async fn list_customers(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
) -> ApiResult<impl IntoResponse> {
    let customers = services::list_customers(store.as_ref(), &coordinator).await?;
    Ok(Json(customers))
}

/// GET /customer/{id} - Get a customer by id
#[utoipa::path(
    get,
    path = "/customer/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id, greater than 0")),
    responses(
        (status = 200, description = "Customer found", body = Customer),
        (status = 400, description = "Invalid id", body = ProblemDetail),
        (status = 404, description = "Customer not found", body = ProblemDetail),
    ),
)]
pub async fn get_customer(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
    PositiveId(id): PositiveId,
) -> ApiResult<impl IntoResponse> {
    let customer = services::get_customer(store.as_ref(), &coordinator, id).await?;
    Ok(Json(customer))
}

/// POST /customer - Create a customer
#[utoipa::path(
    post,
    path = "/customer",
    tag = "Customers",
    request_body = NewCustomer,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid input", body = ProblemDetail),
    ),
)]
pub async fn create_customer(
    State(store): State<Arc<dyn RecordStore>>,
    State(coordinator): State<InvalidationCoordinator>,
    ValidJson(req): ValidJson<NewCustomer>,
) -> ApiResult<impl IntoResponse> {
    let outcome = services::create_customer(store.as_ref(), &coordinator, &req).await?;
    Ok((StatusCode::CREATED, Json(outcome.into_value())))
}

/// POST /customer/search - Find customers whose name contains any term
#[utoipa::path(
    post,
    path = "/customer/search",
    tag = "Customers",
    request_body = CustomerSearchRequest,
    responses(
        (status = 200, description = "Matching customers", body = Vec<Customer>),
        (status = 400, description = "Invalid search input", body = ProblemDetail),
    ),
)]
pub async fn search_customers(
    State(store): State<Arc<dyn RecordStore>>,
    State(predicates): State<PredicateBuilder>,
    ValidJson(req): ValidJson<CustomerSearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let customers = services::search_customers(store.as_ref(), &predicates, &req).await?;
    Ok(Json(customers))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/search", post(search_customers))
        .route("/:id", get(get_customer))
        .with_state(state)
}
