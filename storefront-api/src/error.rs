//! Error Types for the Storefront API
//!
//! This module defines error handling for the API layer, including:
//! - `ApiError`, the four-way failure taxonomy every handler returns
//! - `FieldFailures`, per-field aggregation of validation messages
//! - `ProblemDetail`, the uniform `application/problem+json` body
//! - `ErrorClassifier`, which maps an `ApiError` to a status and body
//!
//! Every failure is converted exactly once, at the HTTP boundary. Anything
//! that does not classify as not-found, bad-request or validation becomes
//! `Internal`, whose cause is logged and never echoed to the client.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use storefront_core::{StorageError, StoreError, ValidationError};
use thiserror::Error;

use crate::messages::{self, MessageCatalog, MessageResolver, DEFAULT_LOCALE};

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

// ============================================================================
// FIELD FAILURES
// ============================================================================

/// Validation messages grouped by field. A field reported twice with
/// different messages keeps both; the same message twice is kept once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct FieldFailures(BTreeMap<String, BTreeSet<String>>);

impl FieldFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failing field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut failures = Self::new();
        failures.add(field, message);
        failures
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().insert(message.into());
    }

    pub fn merge(&mut self, other: FieldFailures) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing failed, otherwise a validation error.
    pub fn into_result(self, scope: ValidationScope) -> ApiResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation {
                scope,
                failures: self,
            })
        }
    }
}

impl<F: Into<String>, M: Into<String>> FromIterator<(F, M)> for FieldFailures {
    fn from_iter<I: IntoIterator<Item = (F, M)>>(iter: I) -> Self {
        let mut failures = Self::new();
        for (field, message) in iter {
            failures.add(field, message);
        }
        failures
    }
}

/// Where the rejected input came from. Path and query violations are
/// reported as invalid data, body violations as invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationScope {
    Parameter,
    Body,
}

impl ValidationScope {
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationScope::Parameter => messages::INVALID_DATA,
            ValidationScope::Body => messages::INVALID_INPUT,
        }
    }

    fn fallback(&self) -> &'static str {
        match self {
            ValidationScope::Parameter => "Invalid data was supplied",
            ValidationScope::Body => "Invalid input",
        }
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Every failure a handler can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{resource_type} not found for id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        message_key: Option<String>,
    },

    #[error("Validation failed ({scope:?}) on {} field(s)", .failures.len())]
    Validation {
        scope: ValidationScope,
        failures: FieldFailures,
    },

    #[error("Internal error: {cause}")]
    Internal { cause: String },
}

impl ApiError {
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            message_key: None,
        }
    }

    /// A bad request whose detail is looked up in the message catalog,
    /// with `message` as the fallback text.
    pub fn bad_request_keyed(message: impl Into<String>, key: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            message_key: Some(key.into()),
        }
    }

    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            scope: ValidationScope::Parameter,
            failures: FieldFailures::single(field, message),
        }
    }

    pub fn invalid_body(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            scope: ValidationScope::Body,
            failures: FieldFailures::single(field, message),
        }
    }

    pub fn internal(cause: impl Into<String>) -> Self {
        ApiError::Internal {
            cause: cause.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Validation { .. } => "validation",
            ApiError::Internal { .. } => "internal",
        }
    }
}

// ============================================================================
// PROBLEM DETAIL
// ============================================================================

/// Uniform error body, served as `application/problem+json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<FieldFailures>,
}

impl ProblemDetail {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            failures: None,
        }
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_failures(mut self, failures: FieldFailures) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Render as a response with the problem content type.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

// ============================================================================
// ERROR CLASSIFIER
// ============================================================================

/// Maps an [`ApiError`] to a status code and problem body, resolving
/// detail text through a [`MessageResolver`] for one locale.
#[derive(Clone)]
pub struct ErrorClassifier {
    resolver: Arc<dyn MessageResolver>,
    locale: String,
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(MessageCatalog::default()), DEFAULT_LOCALE)
    }
}

impl ErrorClassifier {
    pub fn new(resolver: Arc<dyn MessageResolver>, locale: impl Into<String>) -> Self {
        Self {
            resolver,
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn classify(&self, error: &ApiError) -> (StatusCode, ProblemDetail) {
        let status = error.status_code();
        let problem = match error {
            ApiError::NotFound { resource_type, id } => {
                let args = [resource_type.clone(), id.clone()];
                let detail = self.message(messages::RESOURCE_NOT_FOUND, &args).unwrap_or_else(
                    || {
                        format!(
                            "The requested resource of type {} was not found for ID {}",
                            resource_type, id
                        )
                    },
                );
                ProblemDetail::new(status, detail)
            }
            ApiError::BadRequest {
                message,
                message_key,
            } => {
                let detail = message_key
                    .as_deref()
                    .and_then(|key| self.message(key, &[]))
                    .unwrap_or_else(|| message.clone());
                ProblemDetail::new(status, detail)
            }
            ApiError::Validation { scope, failures } => {
                let detail = self
                    .message(scope.message_key(), &[])
                    .unwrap_or_else(|| scope.fallback().to_string());
                ProblemDetail::new(status, detail).with_failures(failures.clone())
            }
            ApiError::Internal { .. } => {
                let detail = self.message(messages::INTERNAL_SERVER_ERROR, &[]).unwrap_or_else(
                    || "An error has occurred - Please try again in a few minutes".to_string(),
                );
                ProblemDetail::new(status, detail)
            }
        };
        (status, problem)
    }

    fn message(&self, key: &str, args: &[String]) -> Option<String> {
        self.resolver.resolve(key, args, &self.locale)
    }
}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Renders with the default English classifier and stashes the error in
/// the response extensions, so the problem middleware can re-render it
/// with the configured classifier and add the request path.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { cause } = &self {
            tracing::error!(cause = %cause, "Internal server error");
        }
        let (status, problem) = ErrorClassifier::default().classify(&self);
        let mut response = problem.into_response_with(status);
        response.extensions_mut().insert(self);
        response
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(StorageError::NotFound { entity_type, id }) => {
                ApiError::not_found(entity_type.as_str(), id)
            }
            StoreError::Storage(StorageError::Duplicate { entity_type, value }) => {
                tracing::debug!(%entity_type, %value, "Duplicate entity rejected");
                ApiError::bad_request_keyed(
                    "The operation would create a duplicate entity",
                    messages::DUPLICATE_ENTITY,
                )
            }
            StoreError::Storage(other) => ApiError::internal(other.to_string()),
            StoreError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::invalid_body(field, "must not be blank")
            }
            StoreError::Validation(ValidationError::InvalidValue { field, reason }) => {
                ApiError::invalid_body(field, reason)
            }
            StoreError::Validation(ValidationError::ConstraintViolation { constraint, reason }) => {
                ApiError::bad_request_keyed(reason, constraint)
            }
            StoreError::Validation(ValidationError::EmptySearchQuery) => {
                ApiError::bad_request_keyed(
                    "The search query contains no search terms",
                    messages::EMPTY_SEARCH_QUERY,
                )
            }
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::internal(format!("Database operation failed: {}", err))
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                ApiError::internal("Database connection pool exhausted")
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::internal("Database connection pool is closed")
            }
            other => ApiError::internal(format!("Failed to acquire database connection: {}", other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::invalid_body("body", e.body_text()),
            JsonRejection::JsonSyntaxError(e) => ApiError::invalid_body("body", e.body_text()),
            JsonRejection::MissingJsonContentType(e) => {
                ApiError::invalid_body("content-type", e.body_text())
            }
            other => ApiError::bad_request(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => {
                ApiError::invalid_parameter("id", e.body_text())
            }
            other => ApiError::internal(format!("Path extraction failed: {}", other.body_text())),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
