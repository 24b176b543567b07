//! In-process cache backend.
//!
//! Each region is guarded by its own `RwLock`, which gives per-key atomicity
//! for `put_if_absent` and per-region atomicity for `evict_all`. Locks are
//! never held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::{CacheError, CacheResult};
use super::region::{CacheKey, CacheRegion};
use super::traits::{CacheBackend, CacheStats};

type Entries = HashMap<CacheKey, Vec<u8>>;

/// Default [`CacheBackend`]: four independent hash maps.
#[derive(Debug, Default)]
pub struct InMemoryCacheBackend {
    regions: [RwLock<Entries>; 4],
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn region(&self, region: CacheRegion) -> &RwLock<Entries> {
        &self.regions[region.index()]
    }

    /// Number of entries currently held in `region`.
    pub fn len(&self, region: CacheRegion) -> CacheResult<usize> {
        self.region(region)
            .read()
            .map(|entries| entries.len())
            .map_err(|_| CacheError::poisoned(region))
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, region: CacheRegion, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let entries = self
            .region(region)
            .read()
            .map_err(|_| CacheError::poisoned(region))?;
        let value = entries.get(key).cloned();
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn put_if_absent(
        &self,
        region: CacheRegion,
        key: CacheKey,
        value: Vec<u8>,
    ) -> CacheResult<Option<Vec<u8>>> {
        let mut entries = self
            .region(region)
            .write()
            .map_err(|_| CacheError::poisoned(region))?;
        if let Some(existing) = entries.get(&key) {
            return Ok(Some(existing.clone()));
        }
        entries.insert(key, value);
        Ok(None)
    }

    async fn evict_one(&self, region: CacheRegion, key: &CacheKey) -> CacheResult<bool> {
        let mut entries = self
            .region(region)
            .write()
            .map_err(|_| CacheError::poisoned(region))?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    async fn evict_all(&self, region: CacheRegion) -> CacheResult<u64> {
        let mut entries = self
            .region(region)
            .write()
            .map_err(|_| CacheError::poisoned(region))?;
        let removed = entries.len() as u64;
        entries.clear();
        self.evictions.fetch_add(removed, Ordering::Relaxed);
        Ok(removed)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let mut entry_count = 0u64;
        for region in CacheRegion::ALL {
            entry_count += self.len(region)? as u64;
        }
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_put_if_absent_keeps_first_value() -> CacheResult<()> {
        let backend = InMemoryCacheBackend::new();
        let region = CacheRegion::Customers;

        assert_eq!(backend.put_if_absent(region, CacheKey::Id(1), b"a".to_vec()).await?, None);
        assert_eq!(
            backend.put_if_absent(region, CacheKey::Id(1), b"b".to_vec()).await?,
            Some(b"a".to_vec())
        );
        assert_eq!(backend.get(region, &CacheKey::Id(1)).await?, Some(b"a".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn test_regions_are_independent() -> CacheResult<()> {
        let backend = InMemoryCacheBackend::new();
        backend
            .put_if_absent(CacheRegion::Customers, CacheKey::Id(1), b"c".to_vec())
            .await?;
        backend
            .put_if_absent(CacheRegion::Orders, CacheKey::Id(1), b"o".to_vec())
            .await?;

        assert_eq!(backend.evict_all(CacheRegion::Orders).await?, 1);
        assert_eq!(backend.get(CacheRegion::Orders, &CacheKey::Id(1)).await?, None);
        assert_eq!(
            backend.get(CacheRegion::Customers, &CacheKey::Id(1)).await?,
            Some(b"c".to_vec())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_evict_one_only_removes_key() -> CacheResult<()> {
        let backend = InMemoryCacheBackend::new();
        let region = CacheRegion::Customers;
        backend.put_if_absent(region, CacheKey::Id(1), vec![1]).await?;
        backend.put_if_absent(region, CacheKey::Id(2), vec![2]).await?;

        assert!(backend.evict_one(region, &CacheKey::Id(1)).await?);
        assert!(!backend.evict_one(region, &CacheKey::Id(1)).await?);
        assert_eq!(backend.len(region)?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_track_hits_misses_evictions() -> CacheResult<()> {
        let backend = InMemoryCacheBackend::new();
        let region = CacheRegion::AllOrders;
        backend.get(region, &CacheKey::All).await?;
        backend.put_if_absent(region, CacheKey::All, vec![0]).await?;
        backend.get(region, &CacheKey::All).await?;
        backend.evict_all(region).await?;

        let stats = backend.stats().await?;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entry_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_poisoned_region_reports_unavailable() {
        let backend = Arc::new(InMemoryCacheBackend::new());
        let poisoner = Arc::clone(&backend);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.regions[CacheRegion::Orders.index()].write();
            panic!("poison the orders region");
        })
        .join();

        let err = backend.get(CacheRegion::Orders, &CacheKey::Id(1)).await;
        assert!(matches!(
            err,
            Err(CacheError::Unavailable {
                region: CacheRegion::Orders,
                ..
            })
        ));
        // Other regions keep working.
        assert!(backend
            .get(CacheRegion::Customers, &CacheKey::Id(1))
            .await
            .is_ok());
    }
}
