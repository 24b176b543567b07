//! Error types for storefront record operations

use crate::{EntityId, EntityType};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    #[error("Duplicate {entity_type}: {value}")]
    Duplicate { entity_type: EntityType, value: String },

    #[error("Insert failed for {entity_type}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors raised by domain rules before anything is written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A business rule keyed by a message bundle key (for example
    /// `order.product.size`).
    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },

    #[error("Search query contains no usable terms")]
    EmptySearchQuery,
}

/// Master error type for record store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Shorthand for the most common storage failure.
    pub fn not_found(entity_type: EntityType, id: EntityId) -> Self {
        StoreError::Storage(StorageError::NotFound { entity_type, id })
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        StoreError::Storage(StorageError::Backend {
            reason: reason.into(),
        })
    }

    /// True when the error means "no such record" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Storage(StorageError::NotFound { .. }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
