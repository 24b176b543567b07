//! Request Validation
//!
//! Field checks that collect every failure before reporting, so a request
//! with three problems gets one response listing all three.

use storefront_core::{EntityId, NewCustomer, NewOrder, NewProduct};

use crate::error::{ApiError, ApiResult, FieldFailures, ValidationScope};
use crate::messages;
use crate::types::CustomerSearchRequest;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MIN_CHARS: usize = 2;
pub const DESCRIPTION_MAX_CHARS: usize = 255;

/// Accumulates field failures for one request.
#[derive(Debug)]
pub struct FieldValidator {
    scope: ValidationScope,
    failures: FieldFailures,
}

impl FieldValidator {
    pub fn body() -> Self {
        Self {
            scope: ValidationScope::Body,
            failures: FieldFailures::new(),
        }
    }

    pub fn parameters() -> Self {
        Self {
            scope: ValidationScope::Parameter,
            failures: FieldFailures::new(),
        }
    }

    pub fn not_blank(&mut self, field: &str, value: &str, message: impl Into<String>) -> &mut Self {
        if value.trim().is_empty() {
            self.failures.add(field, message);
        }
        self
    }

    /// Length in characters, inclusive on both ends.
    pub fn length_between(
        &mut self,
        field: &str,
        value: &str,
        min: usize,
        max: usize,
        message: impl Into<String>,
    ) -> &mut Self {
        let len = value.chars().count();
        if len < min || len > max {
            self.failures.add(field, message);
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: EntityId) -> &mut Self {
        if value <= 0 {
            self.failures.add(field, "must be greater than 0");
        }
        self
    }

    pub fn failures(&self) -> &FieldFailures {
        &self.failures
    }

    pub fn finish(self) -> ApiResult<()> {
        self.failures.into_result(self.scope)
    }
}

/// Check for a request type; all failures are reported together.
pub trait Validate {
    fn validate(&self) -> ApiResult<()>;
}

impl Validate for NewCustomer {
    fn validate(&self) -> ApiResult<()> {
        let mut v = FieldValidator::body();
        v.not_blank(
            "name",
            &self.name,
            messages::english(messages::CUSTOMER_NAME_INPUT, &[]),
        );
        v.length_between(
            "name",
            &self.name,
            0,
            NAME_MAX_CHARS,
            messages::english(messages::CUSTOMER_NAME_SIZE, &[NAME_MAX_CHARS.to_string()]),
        );
        v.finish()
    }
}

impl Validate for CustomerSearchRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut v = FieldValidator::body();
        v.length_between(
            "name",
            &self.name,
            NAME_MIN_CHARS,
            NAME_MAX_CHARS,
            size_message(messages::CUSTOMER_SEARCH_INPUT, NAME_MIN_CHARS, NAME_MAX_CHARS),
        );
        v.finish()
    }
}

impl Validate for NewProduct {
    fn validate(&self) -> ApiResult<()> {
        let mut v = FieldValidator::body();
        v.not_blank("description", &self.description, "must not be blank");
        v.length_between(
            "description",
            &self.description,
            DESCRIPTION_MIN_CHARS,
            DESCRIPTION_MAX_CHARS,
            size_message(
                messages::PRODUCT_DESCRIPTION_INPUT,
                DESCRIPTION_MIN_CHARS,
                DESCRIPTION_MAX_CHARS,
            ),
        );
        v.finish()
    }
}

/// Shape checks only. An empty product list is a business rule enforced
/// by the order service.
impl Validate for NewOrder {
    fn validate(&self) -> ApiResult<()> {
        let mut v = FieldValidator::body();
        v.positive("customer_id", self.customer_id);
        for id in &self.product_ids {
            v.positive("product_ids", *id);
        }
        if let Some(description) = &self.description {
            v.length_between(
                "description",
                description,
                0,
                DESCRIPTION_MAX_CHARS,
                size_message(messages::PRODUCT_DESCRIPTION_INPUT, 0, DESCRIPTION_MAX_CHARS),
            );
        }
        v.finish()
    }
}

fn size_message(key: &str, min: usize, max: usize) -> String {
    messages::english(key, &[min.to_string(), max.to_string()])
}

/// Path and query ids must be positive.
pub fn validate_positive_id(field: &str, id: EntityId) -> ApiResult<EntityId> {
    if id <= 0 {
        return Err(ApiError::invalid_parameter(field, "must be greater than 0"));
    }
    Ok(id)
}
