//! Storefront Core - Entity Types and Search Predicates
//!
//! Pure data structures shared by every other crate in the workspace:
//! customers, orders and products, the storage error taxonomy, and the
//! free-text name filter used by customer search.

pub mod entities;
pub mod error;
pub mod filter;

pub use entities::{
    Customer, CustomerOrder, EntityId, EntityType, NewCustomer, NewOrder, NewProduct, Order,
    OrderCustomer, OrderProduct, Product,
};
pub use error::{StorageError, StoreError, StoreResult, ValidationError};
pub use filter::{
    tokenize, Combinator, EmptyQueryPolicy, NameFilter, PredicateBuilder, SearchToken,
    SqlCondition,
};
