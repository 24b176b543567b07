//! Typed facade over a [`CacheBackend`].

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::error::{CacheError, CacheResult};
use super::memory::InMemoryCacheBackend;
use super::region::{CacheKey, CacheRegion};
use super::traits::{CacheBackend, CacheStats};

/// The application's cache: the four named regions behind one backend.
///
/// Cheap to clone; clones share the backend. Values are stored as JSON.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh [`InMemoryCacheBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCacheBackend::new()))
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        region: CacheRegion,
        key: &CacheKey,
    ) -> CacheResult<Option<T>> {
        match self.backend.get(region, key).await? {
            Some(bytes) => decode(region, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Insert only when absent. Returns the value that was already stored,
    /// so a losing writer sees the winner.
    pub async fn put_if_absent<T: Serialize + DeserializeOwned>(
        &self,
        region: CacheRegion,
        key: CacheKey,
        value: &T,
    ) -> CacheResult<Option<T>> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
            region,
            reason: e.to_string(),
        })?;
        match self.backend.put_if_absent(region, key, bytes).await? {
            Some(existing) => decode(region, &existing).map(Some),
            None => Ok(None),
        }
    }

    pub async fn evict_one(&self, region: CacheRegion, key: &CacheKey) -> CacheResult<bool> {
        self.backend.evict_one(region, key).await
    }

    pub async fn evict_all(&self, region: CacheRegion) -> CacheResult<u64> {
        self.backend.evict_all(region).await
    }

    pub async fn stats(&self) -> CacheResult<CacheStats> {
        self.backend.stats().await
    }
}

fn decode<T: DeserializeOwned>(region: CacheRegion, bytes: &[u8]) -> CacheResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization {
        region,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Customer;

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            orders: vec![],
        }
    }

    #[tokio::test]
    async fn test_loser_observes_winner() -> CacheResult<()> {
        let store = CacheStore::in_memory();
        let region = CacheRegion::Customers;

        let first = store
            .put_if_absent(region, CacheKey::Id(1), &customer(1, "John Smith"))
            .await?;
        assert!(first.is_none());

        let second = store
            .put_if_absent(region, CacheKey::Id(1), &customer(1, "Someone Else"))
            .await?;
        assert_eq!(second.map(|c| c.name), Some("John Smith".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_evict_all_then_get_is_absent() -> CacheResult<()> {
        let store = CacheStore::in_memory();
        let list = vec![customer(1, "a"), customer(2, "b")];
        store
            .put_if_absent(CacheRegion::AllCustomers, CacheKey::All, &list)
            .await?;
        store.evict_all(CacheRegion::AllCustomers).await?;

        let cached: Option<Vec<Customer>> =
            store.get(CacheRegion::AllCustomers, &CacheKey::All).await?;
        assert!(cached.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_type_mismatch_is_serialization_error() -> CacheResult<()> {
        let store = CacheStore::in_memory();
        store
            .put_if_absent(CacheRegion::Orders, CacheKey::Id(3), &"not an order".to_string())
            .await?;
        let read: CacheResult<Option<Customer>> =
            store.get(CacheRegion::Orders, &CacheKey::Id(3)).await;
        assert!(matches!(read, Err(CacheError::Serialization { .. })));
        Ok(())
    }
}
