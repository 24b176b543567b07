//! Concurrency properties of the region cache under a multi-threaded runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use storefront_core::Customer;
use storefront_storage::{CacheKey, CacheRegion, CacheResult, CacheStore, InvalidationCoordinator};

fn customer(id: i64, name: String) -> Customer {
    Customer {
        id,
        name,
        orders: vec![],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_put_if_absent_has_single_winner() -> CacheResult<()> {
    let store = CacheStore::in_memory();
    let mut handles = Vec::new();

    for writer in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let value = customer(1, format!("writer-{}", writer));
            let previous = store
                .put_if_absent(CacheRegion::Customers, CacheKey::Id(1), &value)
                .await?;
            Ok::<_, storefront_storage::CacheError>((value, previous))
        }));
    }

    let mut inserted = Vec::new();
    let mut observed = Vec::new();
    for handle in handles {
        let (value, previous) = match handle.await {
            Ok(result) => result?,
            Err(join) => panic!("writer task failed: {}", join),
        };
        match previous {
            None => inserted.push(value),
            Some(winner) => observed.push(winner),
        }
    }

    assert_eq!(inserted.len(), 1, "exactly one writer inserts");
    let winner = &inserted[0];
    assert!(observed.iter().all(|seen| seen == winner));

    let stored: Option<Customer> = store.get(CacheRegion::Customers, &CacheKey::Id(1)).await?;
    assert_eq!(stored.as_ref(), Some(winner));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_read_through_agrees_on_value() -> Result<(), String> {
    let coordinator = InvalidationCoordinator::new(CacheStore::in_memory());
    let fetches = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();

    for reader in 0..16 {
        let coordinator = coordinator.clone();
        let fetches = Arc::clone(&fetches);
        handles.push(tokio::spawn(async move {
            coordinator
                .read_through(CacheRegion::Customers, CacheKey::Id(7), move || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(customer(7, format!("reader-{}", reader)))
                })
                .await
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        let value = handle.await.map_err(|e| e.to_string())??;
        seen.push(value);
    }

    assert!(fetches.load(Ordering::SeqCst) >= 1);
    let first = &seen[0];
    assert!(seen.iter().all(|c| c == first), "all readers return the stored winner");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn evict_all_clears_every_prior_entry() -> CacheResult<()> {
    let store = CacheStore::in_memory();
    for id in 1..=50 {
        store
            .put_if_absent(CacheRegion::Orders, CacheKey::Id(id), &customer(id, "x".into()))
            .await?;
    }
    let removed = store.evict_all(CacheRegion::Orders).await?;
    assert_eq!(removed, 50);

    for id in 1..=50 {
        let cached: Option<Customer> = store.get(CacheRegion::Orders, &CacheKey::Id(id)).await?;
        assert!(cached.is_none());
    }
    Ok(())
}
