#![cfg(feature = "db-tests")]
//! End-to-end smoke tests against PostgreSQL.
//!
//! Run with `--features db-tests` and `STOREFRONT_DB_*` pointing at a
//! scratch database.

use storefront_api::{ApiResult, DbClient, DbConfig};
use storefront_core::{NameFilter, PredicateBuilder, StorageError, StoreError};
use storefront_storage::RecordStore;
use storefront_test_utils::fixtures;

fn test_db() -> ApiResult<DbClient> {
    let config = DbConfig::from_env();
    DbClient::from_config(&config)
}

#[tokio::test]
async fn smoke_test_full_create_chain() -> ApiResult<()> {
    let db = test_db()?;
    db.migrate().await?;
    db.health_check().await?;

    let suffix = std::process::id();
    let customer = db
        .customer_create(&fixtures::new_customer(&format!("Smoke Customer {}", suffix)))
        .await?;
    let desk = db
        .product_create(&fixtures::new_product(&format!("Smoke Desk {}", suffix)))
        .await?;
    let lamp = db
        .product_create(&fixtures::new_product(&format!("Smoke Lamp {}", suffix)))
        .await?;

    let order = db
        .order_create(&fixtures::new_order(customer.id, &[lamp.id, desk.id, lamp.id]))
        .await?;
    assert_eq!(order.customer.id, customer.id);
    let product_ids: Vec<i64> = order.products.iter().map(|p| p.id).collect();
    assert_eq!(product_ids, vec![lamp.id, desk.id]);

    let reloaded = db.customer_get(customer.id).await?;
    assert_eq!(
        reloaded.map(|c| c.orders.iter().map(|o| o.id).collect::<Vec<_>>()),
        Some(vec![order.id])
    );

    let found = db
        .product_find_by_description(&format!("smoke desk {}", suffix))
        .await?;
    assert_eq!(found.map(|p| p.id), Some(desk.id));

    let filter: NameFilter = PredicateBuilder::default()
        .build_name_filter(&format!("SMOKE {}", suffix));
    let matches = db.customer_search(&filter).await?;
    assert!(matches.iter().any(|c| c.id == customer.id));

    println!("Full create chain passed");
    Ok(())
}

#[tokio::test]
async fn smoke_test_duplicate_description_maps_to_duplicate() -> ApiResult<()> {
    let db = test_db()?;
    db.migrate().await?;

    let description = format!("Smoke Chair {}", std::process::id());
    db.product_create(&fixtures::new_product(&description)).await?;
    let second = db
        .product_create(&fixtures::new_product(&description.to_uppercase()))
        .await;

    assert!(matches!(
        second,
        Err(StoreError::Storage(StorageError::Duplicate { .. }))
    ));
    Ok(())
}
