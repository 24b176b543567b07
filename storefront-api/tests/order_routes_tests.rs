//! Order Route Tests

use std::sync::Arc;

use serde_json::json;
use storefront_test_utils::{fixtures, CountingStore};

#[path = "support/http.rs"]
mod http;
use http::{get, post, test_app};

async fn seeded() -> (Arc<CountingStore>, fixtures::Seeded) {
    let store = Arc::new(CountingStore::in_memory());
    let seeded = fixtures::seed(store.as_ref()).await.expect("seed");
    store.reset();
    (store, seeded)
}

#[tokio::test]
async fn test_create_order_links_customer_and_products() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());
    let customer = &seeded.customers[1];
    let (desk, lamp) = (&seeded.products[0], &seeded.products[2]);

    let response = post(
        &app,
        "/order",
        json!({
            "description": "study",
            "customer_id": customer.id,
            "product_ids": [lamp.id, desk.id, lamp.id],
        }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.body["customer"], json!({ "id": customer.id, "name": customer.name }));
    // Duplicates collapse; request order is kept.
    assert_eq!(
        response.body["products"],
        json!([
            { "id": lamp.id, "description": "Lamp" },
            { "id": desk.id, "description": "Desk" },
        ])
    );

    let product = get(&app, &format!("/products/{}", lamp.id)).await;
    assert_eq!(product.body["orders"], json!([response.body["id"]]));
}

#[tokio::test]
async fn test_get_after_create_uses_primed_entry() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());

    let created = post(
        &app,
        "/order",
        json!({ "customer_id": seeded.customers[0].id, "product_ids": [seeded.products[1].id] }),
    )
    .await;
    let id = created.body["id"].as_i64().expect("id");

    let fetched = get(&app, &format!("/order/{}", id)).await;

    assert_eq!(fetched.status.as_u16(), 200);
    assert_eq!(fetched.body, created.body);
    assert_eq!(store.calls("order_get"), 0);
}

#[tokio::test]
async fn test_order_list_is_refetched_after_create() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());

    let before = get(&app, "/order").await;
    assert_eq!(before.body.as_array().map(Vec::len), Some(1));

    post(
        &app,
        "/order",
        json!({ "customer_id": seeded.customers[2].id, "product_ids": [seeded.products[0].id] }),
    )
    .await;

    let after = get(&app, "/order").await;
    assert_eq!(after.body.as_array().map(Vec::len), Some(2));
    assert_eq!(store.calls("order_list"), 2);
}

#[tokio::test]
async fn test_empty_product_list_is_bad_request() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());

    let response = post(
        &app,
        "/order",
        json!({ "customer_id": seeded.customers[0].id, "product_ids": [] }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.detail(), Some("At least one product is required"));
    assert!(response.body.get("failures").is_none());
    assert_eq!(store.calls("order_create"), 0);
}

#[tokio::test]
async fn test_unknown_customer_is_not_found() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());

    let response = post(
        &app,
        "/order",
        json!({ "customer_id": 999, "product_ids": [seeded.products[0].id] }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(
        response.detail(),
        Some("The requested resource of type Customer was not found for ID 999")
    );
}

#[tokio::test]
async fn test_unknown_customer_wins_over_empty_product_list() {
    let (store, _) = seeded().await;
    let app = test_app(store.clone());

    let response = post(
        &app,
        "/order",
        json!({ "customer_id": 999, "product_ids": [] }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(
        response.detail(),
        Some("The requested resource of type Customer was not found for ID 999")
    );
    assert_eq!(store.calls("order_create"), 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found_and_nothing_is_written() {
    let (store, seeded) = seeded().await;
    let app = test_app(store.clone());
    let customer_id = seeded.customers[0].id;

    let response = post(
        &app,
        "/order",
        json!({ "customer_id": customer_id, "product_ids": [seeded.products[0].id, 77] }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(
        response.detail(),
        Some("The requested resource of type Product was not found for ID 77")
    );

    let customer = get(&app, &format!("/customer/{}", customer_id)).await;
    assert_eq!(customer.body["orders"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_non_positive_ids_in_body_are_validation_failures() {
    let (store, _) = seeded().await;
    let app = test_app(store.clone());

    let response = post(
        &app,
        "/order",
        json!({ "customer_id": 0, "product_ids": [-3] }),
    )
    .await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.detail(), Some("Invalid input"));
    let failures = response.body["failures"].as_object().expect("failures");
    assert!(failures.contains_key("customer_id"));
    assert!(failures.contains_key("product_ids"));
    assert_eq!(store.total(), 0);
}

#[tokio::test]
async fn test_zero_id_never_reaches_the_store() {
    let (store, _) = seeded().await;
    let app = test_app(store.clone());

    let response = get(&app, "/order/0").await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.detail(), Some("Invalid data was supplied"));
    assert_eq!(
        response.body["failures"],
        json!({ "id": ["must be greater than 0"] })
    );
    assert_eq!(store.total(), 0);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (store, _) = seeded().await;
    let app = test_app(store.clone());

    let response = get(&app, "/order/abc").await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(response.detail(), Some("Invalid data was supplied"));
    assert!(response.body["failures"].get("id").is_some());
    assert_eq!(store.total(), 0);
}
