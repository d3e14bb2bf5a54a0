//! Integration tests for the cart routes and cart persistence.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use cartoon_cart_integration_tests::TestContext;
use cartoon_cart_storefront::storage::{MemoryStorage, Storage};
use serde_json::{Value, json};

const APPLE: i64 = 6;
const MILK: i64 = 3;

fn quantities(cart: &Value) -> Vec<(i64, i64)> {
    cart["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| (item["id"].as_i64().unwrap(), item["quantity"].as_i64().unwrap()))
        .collect()
}

#[tokio::test]
async fn test_empty_cart() {
    let ctx = TestContext::new().await;
    let (status, cart) = ctx.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(quantities(&cart).is_empty());
    assert_eq!(cart["subtotal"], "$0.00");
    assert_eq!(cart["itemCount"], 0);
    assert!(cart.get("warning").is_none());
}

#[tokio::test]
async fn test_apple_apple_milk() {
    let ctx = TestContext::new().await;

    ctx.post("/cart/add", &json!({ "productId": APPLE })).await;
    ctx.post("/cart/add", &json!({ "productId": APPLE })).await;
    let (status, cart) = ctx.post("/cart/add", &json!({ "productId": MILK })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantities(&cart), [(APPLE, 2), (MILK, 1)]);
    assert_eq!(cart["items"][0]["usdPrice"], 0.99);
    assert_eq!(cart["items"][0]["linePrice"], "$1.98");
    assert_eq!(cart["subtotal"], "$3.77");
    assert_eq!(cart["itemCount"], 3);

    let (_, count) = ctx.get("/cart/count").await;
    assert_eq!(count["count"], 3);
}

#[tokio::test]
async fn test_add_with_quantity() {
    let ctx = TestContext::new().await;
    let (_, cart) = ctx
        .post("/cart/add", &json!({ "productId": 8, "quantity": 3 }))
        .await;
    let (_, cart2) = ctx
        .post("/cart/add", &json!({ "productId": 8, "quantity": 4 }))
        .await;
    assert_eq!(quantities(&cart), [(8, 3)]);
    assert_eq!(quantities(&cart2), [(8, 7)]);
}

#[tokio::test]
async fn test_add_rejections() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.post("/cart/add", &json!({ "productId": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = ctx
        .post("/cart/add", &json!({ "productId": APPLE, "quantity": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "quantity must be at least 1");

    let (_, cart) = ctx.get("/cart").await;
    assert!(quantities(&cart).is_empty());
}

#[tokio::test]
async fn test_update_remove_clear() {
    let ctx = TestContext::new().await;
    ctx.post("/cart/add", &json!({ "productId": APPLE })).await;
    ctx.post("/cart/add", &json!({ "productId": MILK })).await;

    let (_, cart) = ctx
        .post("/cart/update", &json!({ "productId": APPLE, "quantity": 5 }))
        .await;
    assert_eq!(quantities(&cart), [(APPLE, 5), (MILK, 1)]);

    let (_, cart) = ctx
        .post("/cart/update", &json!({ "productId": MILK, "quantity": 0 }))
        .await;
    assert_eq!(quantities(&cart), [(APPLE, 5)]);

    let (status, cart) = ctx.post("/cart/remove", &json!({ "productId": 42 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quantities(&cart), [(APPLE, 5)]);

    let (_, cart) = ctx.post("/cart/remove", &json!({ "productId": APPLE })).await;
    assert!(quantities(&cart).is_empty());

    ctx.post("/cart/add", &json!({ "productId": APPLE })).await;
    let (_, cart) = ctx.post("/cart/clear", &json!({})).await;
    assert!(quantities(&cart).is_empty());
    let (_, cart) = ctx.post("/cart/clear", &json!({})).await;
    assert!(quantities(&cart).is_empty());
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let mut ctx = TestContext::new().await;
    ctx.post("/cart/add", &json!({ "productId": APPLE, "quantity": 2 }))
        .await;
    ctx.post("/cart/add", &json!({ "productId": 12 })).await;
    let (_, before) = ctx.get("/cart").await;

    ctx.restart();

    let (_, after) = ctx.get("/cart").await;
    assert_eq!(after["items"], before["items"]);
    assert_eq!(after["subtotal"], "$7.97");
}

#[tokio::test]
async fn test_persisted_shape() {
    let ctx = TestContext::new().await;
    ctx.post("/cart/add", &json!({ "productId": APPLE })).await;

    let raw = ctx.local_storage().get("cart").unwrap().unwrap();
    let persisted: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        persisted,
        json!([{
            "id": 6,
            "name": "Apple",
            "usdPrice": 0.99,
            "image": "/assets/apple-fruits.png",
            "quantity": 1
        }])
    );
}

#[tokio::test]
async fn test_malformed_persisted_cart_loads_empty() {
    let mut ctx = TestContext::new().await;
    ctx.local_storage().set("cart", "{\"oops\": ").unwrap();

    ctx.restart();

    let (status, cart) = ctx.get("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(quantities(&cart).is_empty());

    let (_, cart) = ctx.post("/cart/add", &json!({ "productId": MILK })).await;
    assert_eq!(quantities(&cart), [(MILK, 1)]);
}

#[tokio::test]
async fn test_malformed_request_body_rejected() {
    let ctx = TestContext::new().await;

    for body in [
        json!({ "product": "apple" }),
        json!({ "productId": APPLE, "quantity": -1 }),
    ] {
        let (status, reply) = ctx.post("/cart/add", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(reply["error"].is_string(), "{reply}");
    }

    let (status, reply) = ctx
        .post("/cart/update", &json!({ "productId": APPLE }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].is_string());

    let request = Request::post("/cart/remove")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"productId\": "))
        .unwrap();
    let (status, _, reply) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].is_string());

    let (_, cart) = ctx.get("/cart").await;
    assert!(quantities(&cart).is_empty());
}

#[tokio::test]
async fn test_unsaved_change_is_warning_and_kept_in_memory() {
    // Room for one short line, not two.
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::with_quota(120));
    let ctx = TestContext::with_local_storage(Arc::clone(&storage)).await;

    let (status, cart) = ctx.post("/cart/add", &json!({ "productId": APPLE })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart.get("warning").is_none());

    let (status, cart) = ctx.post("/cart/add", &json!({ "productId": 2 })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["warning"].is_string(), "{cart}");
    assert_eq!(quantities(&cart), [(APPLE, 1), (2, 1)]);

    let (_, cart) = ctx.get("/cart").await;
    assert_eq!(quantities(&cart), [(APPLE, 1), (2, 1)]);
    assert!(cart.get("warning").is_none());

    let persisted: Value = serde_json::from_str(&storage.get("cart").unwrap().unwrap()).unwrap();
    assert_eq!(persisted.as_array().unwrap().len(), 1);
}
