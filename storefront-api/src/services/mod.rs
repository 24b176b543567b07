//! Service Layer
//!
//! Business rules between the route handlers and the record store. Writes
//! return a `WriteOutcome` carrying the cache side-effect report; reads of
//! single customers, single orders and the two lists go through the
//! invalidation coordinator's read-through.

mod customer_service;
mod order_service;
mod product_service;

pub use customer_service::*;
pub use order_service::*;
pub use product_service::*;
