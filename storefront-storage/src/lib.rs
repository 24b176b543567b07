//! Storefront Storage - Record Store Trait, In-Memory Store and Region Cache
//!
//! Defines the repository abstraction the API talks to, an in-memory
//! implementation used by default and in tests, and the named-region cache
//! with its invalidation coordinator. The PostgreSQL implementation lives in
//! storefront-api next to its connection pool.

pub mod cache;
pub mod memory;
pub mod repository;

pub use cache::{
    CacheBackend, CacheError, CacheKey, CacheRegion, CacheResult, CacheStats, CacheStore,
    CustomerEvictionScope, InMemoryCacheBackend, InvalidationCoordinator, NoopObserver,
    SideEffectAction, SideEffectFailure, SideEffectObserver, SideEffectReport, WriteOutcome,
};
pub use memory::InMemoryStore;
pub use repository::RecordStore;
