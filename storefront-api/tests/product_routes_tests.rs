//! Product Route Tests

use std::sync::Arc;

use serde_json::json;
use storefront_test_utils::CountingStore;

#[path = "support/http.rs"]
mod http;
use http::{get, post, test_app};

#[tokio::test]
async fn test_create_list_and_get() {
    let store = Arc::new(CountingStore::in_memory());
    let app = test_app(store.clone());

    let created = post(&app, "/products", json!({ "description": "Standing desk" })).await;
    assert_eq!(created.status.as_u16(), 200);
    assert_eq!(created.body["orders"], json!([]));
    let id = created.body["id"].as_i64().expect("id");

    let listed = get(&app, "/products").await;
    assert_eq!(listed.body, json!([created.body.clone()]));

    let fetched = get(&app, &format!("/products/{}", id)).await;
    assert_eq!(fetched.body, created.body);
}

#[tokio::test]
async fn test_duplicate_description_ignores_case_and_padding() {
    let store = Arc::new(CountingStore::in_memory());
    let app = test_app(store.clone());

    post(&app, "/products", json!({ "description": "Duplicate product" })).await;
    let trailing = post(&app, "/products", json!({ "description": "Duplicate product " })).await;
    let recased = post(&app, "/products", json!({ "description": "  dUPLICATE PRODUCT" })).await;

    for duplicate in [trailing, recased] {
        assert_eq!(duplicate.status.as_u16(), 400);
        assert_eq!(
            duplicate.detail(),
            Some("The operation would create a duplicate entity")
        );
    }
    assert_eq!(store.calls("product_create"), 1);
}

#[tokio::test]
async fn test_description_length_is_validated() {
    let store = Arc::new(CountingStore::in_memory());
    let app = test_app(store.clone());

    let response = post(&app, "/products", json!({ "description": "D" })).await;

    assert_eq!(response.status.as_u16(), 400);
    assert_eq!(
        response.body["failures"]["description"],
        json!(["The description must be between 2 and 255 characters"])
    );
    assert_eq!(store.total(), 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = test_app(Arc::new(CountingStore::in_memory()));

    let response = get(&app, "/products/5").await;

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(
        response.detail(),
        Some("The requested resource of type Product was not found for ID 5")
    );
}
