//! Named-region cache with write-time invalidation.
//!
//! Four independent regions hold serialized entity views:
//!
//! | Region          | Key            | Value           |
//! |-----------------|----------------|-----------------|
//! | `customers`     | `Id(customer)` | `Customer`      |
//! | `all_customers` | `All`          | `Vec<Customer>` |
//! | `orders`        | `Id(order)`    | `Order`         |
//! | `all_orders`    | `All`          | `Vec<Order>`    |
//!
//! Entries only appear through read-through population or write-time
//! priming, and only disappear through eviction. There is no TTL.
//!
//! The [`InvalidationCoordinator`] owns the knowledge of which regions a
//! write touches. Cache failures never fail the write that triggered them;
//! they are collected into a [`SideEffectReport`] and handed to a
//! [`SideEffectObserver`].
//!
//! # Example
//!
//! ```ignore
//! let coordinator = InvalidationCoordinator::new(CacheStore::in_memory());
//!
//! let customer = coordinator
//!     .read_through(CacheRegion::Customers, CacheKey::Id(id), || fetch(id))
//!     .await?;
//!
//! let report = coordinator.on_customer_created(&created).await;
//! ```

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod region;
pub mod store;
pub mod traits;

pub use coordinator::{
    CustomerEvictionScope, InvalidationCoordinator, NoopObserver, SideEffectAction,
    SideEffectFailure, SideEffectObserver, SideEffectReport, WriteOutcome,
};
pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCacheBackend;
pub use region::{CacheKey, CacheRegion};
pub use store::CacheStore;
pub use traits::{CacheBackend, CacheStats};
