//! Request and response bodies that are not domain entities.

use serde::{Deserialize, Serialize};

/// Body of `POST /customer/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CustomerSearchRequest {
    /// Free-text query, split on whitespace into case-insensitive terms.
    pub name: String,
}
