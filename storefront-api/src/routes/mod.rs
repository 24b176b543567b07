//! REST API Routes Module
//!
//! Route handlers organized by entity:
//! - `/customer` list, get, create and search
//! - `/order` list, get and create
//! - `/products` list, get and create
//! - `/health/*` checks, `/metrics`, `/openapi.json`
//!
//! Every failure leaves a handler as an `ApiError`; the problem middleware
//! renders it with the configured classifier and the request path.

pub mod customer;
pub mod health;
pub mod order;
pub mod product;

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, Method, Uri},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::{is_production_environment, ApiConfig};
use crate::error::{ApiError, ApiResult, ErrorClassifier};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use customer::create_router as customer_router;
pub use health::create_router as health_router;
pub use order::create_router as order_router;
pub use product::create_router as product_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PROBLEM RESPONSES
// ============================================================================

/// Re-render any `ApiError` a handler or extractor produced with the
/// configured classifier, and record the request path as `instance`.
pub async fn problem_middleware(
    State(classifier): State<ErrorClassifier>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ApiError>() {
        Some(error) => {
            let (status, problem) = classifier.classify(&error);
            problem.with_instance(path).into_response_with(status)
        }
        None => response,
    }
}

/// Unknown paths answer with a problem body like every other failure.
async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found("Path", uri.path())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// In development mode (empty origins) every origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<header::HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS
/// 2. HTTP trace layer
/// 3. Observability (span + metrics)
/// 4. Problem rendering
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> ApiResult<Router> {
    if is_production_environment() {
        api_config.validate_for_production()?;
    }

    let mut router = Router::new()
        .nest("/customer", customer::create_router(state.clone()))
        .nest("/order", order::create_router(state.clone()))
        .nest("/products", product::create_router(state.clone()))
        .nest(
            "/health",
            health::create_router(state.store.clone(), state.start_time),
        )
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .fallback(fallback);

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa_swagger_ui::SwaggerUi;
        router = router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
    }

    router = router
        .layer(from_fn_with_state(state.classifier.clone(), problem_middleware))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(api_config));

    Ok(router)
}
