//! Property-Based Tests for the Region Cache
//!
//! Any sequence of `put_if_absent`, `evict_one` and `evict_all` calls leaves
//! the cache agreeing with a plain map model: first writer wins per key,
//! evictions remove exactly what they name, and regions never leak into
//! each other.

use std::collections::HashMap;

use proptest::prelude::*;
use storefront_storage::{CacheKey, CacheRegion, CacheStore};
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
enum Op {
    Put(CacheRegion, i64, i64),
    EvictOne(CacheRegion, i64),
    EvictAll(CacheRegion),
}

fn arb_region() -> impl Strategy<Value = CacheRegion> {
    prop_oneof![Just(CacheRegion::Customers), Just(CacheRegion::Orders)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_region(), 1i64..5, any::<i64>()).prop_map(|(r, k, v)| Op::Put(r, k, v)),
        2 => (arb_region(), 1i64..5).prop_map(|(r, k)| Op::EvictOne(r, k)),
        1 => arb_region().prop_map(Op::EvictAll),
    ]
}

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn fail(e: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cache_matches_map_model(ops in prop::collection::vec(arb_op(), 0..40)) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = CacheStore::in_memory();
            let mut model: HashMap<(CacheRegion, i64), i64> = HashMap::new();

            for op in &ops {
                match op {
                    Op::Put(region, key, value) => {
                        let previous = store
                            .put_if_absent(*region, CacheKey::Id(*key), value)
                            .await
                            .map_err(fail)?;
                        let expected = model.get(&(*region, *key)).copied();
                        prop_assert_eq!(previous, expected);
                        model.entry((*region, *key)).or_insert(*value);
                    }
                    Op::EvictOne(region, key) => {
                        let removed = store
                            .evict_one(*region, &CacheKey::Id(*key))
                            .await
                            .map_err(fail)?;
                        prop_assert_eq!(removed, model.remove(&(*region, *key)).is_some());
                    }
                    Op::EvictAll(region) => {
                        let removed = store.evict_all(*region).await.map_err(fail)?;
                        let before = model.len();
                        model.retain(|(r, _), _| r != region);
                        prop_assert_eq!(removed, (before - model.len()) as u64);
                    }
                }
            }

            for region in [CacheRegion::Customers, CacheRegion::Orders] {
                for key in 1i64..5 {
                    let cached: Option<i64> =
                        store.get(region, &CacheKey::Id(key)).await.map_err(fail)?;
                    prop_assert_eq!(cached, model.get(&(region, key)).copied());
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_evict_all_then_get_is_absent(
        keys in prop::collection::vec(1i64..100, 1..20),
        region in arb_region(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let store = CacheStore::in_memory();
            for key in &keys {
                store
                    .put_if_absent(region, CacheKey::Id(*key), key)
                    .await
                    .map_err(fail)?;
            }
            store.evict_all(region).await.map_err(fail)?;
            for key in &keys {
                let cached: Option<i64> =
                    store.get(region, &CacheKey::Id(*key)).await.map_err(fail)?;
                prop_assert_eq!(cached, None);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
