//! Cache backend trait.
//!
//! Backends deal in opaque bytes; typing and serialization happen one level
//! up in [`CacheStore`](super::CacheStore), so a remote backend can be
//! plugged in without touching the coordination logic.

use async_trait::async_trait;

use super::error::CacheResult;
use super::region::{CacheKey, CacheRegion};

/// Pluggable storage for cache regions.
///
/// # Atomicity
///
/// - `put_if_absent` must be atomic with respect to concurrent
///   `put_if_absent`, `evict_one` and `evict_all` on the same region.
/// - Once `evict_all` returns, no entry inserted before the call may be
///   observable through `get`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a value. Absence is `Ok(None)`, never an error.
    async fn get(&self, region: CacheRegion, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Insert `value` only if nothing is stored under `key`.
    ///
    /// Returns the value that was already present, or `None` when this call
    /// inserted.
    async fn put_if_absent(
        &self,
        region: CacheRegion,
        key: CacheKey,
        value: Vec<u8>,
    ) -> CacheResult<Option<Vec<u8>>>;

    /// Remove one mapping. Returns whether anything was removed.
    async fn evict_one(&self, region: CacheRegion, key: &CacheKey) -> CacheResult<bool>;

    /// Clear a whole region. Returns the number of entries removed.
    async fn evict_all(&self, region: CacheRegion) -> CacheResult<u64>;

    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache, across regions.
    pub entry_count: u64,
    /// Number of entries removed by eviction.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
