//! Storefront API - REST Layer
//!
//! Axum routes for customers, orders and products over a pluggable record
//! store, with read-through caching of customers and orders, multi-term
//! customer search and uniform `application/problem+json` failures.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod messages;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use config::{ApiConfig, StorageKind};
pub use db::{DbClient, DbConfig};
pub use error::{
    ApiError, ApiResult, ErrorClassifier, FieldFailures, ProblemDetail, ValidationScope,
};
pub use messages::{MessageCatalog, MessageResolver};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
pub use types::CustomerSearchRequest;
