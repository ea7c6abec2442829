mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use common::{decimal, Shop};
use ivma_store::domain::aggregates::MAX_LINE_QUANTITY;

#[tokio::test]
async fn empty_cart_view_for_new_customer() {
    let shop = Shop::open().await;
    let (status, body) = shop.send("GET", "/api/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    let cart = &body["cart"];
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["itemCount"], 0);
    assert_eq!(cart["status"], "active");
    assert_eq!(cart["isExpired"], false);
    assert_eq!(decimal(&cart["total"]), Decimal::ZERO);
    assert!(cart.get("_id").is_none(), "unsaved cart must not expose an id: {cart}");
}

#[tokio::test]
async fn cart_id_is_stable_once_saved() {
    let shop = Shop::open().await;
    let (_, first) = shop.send("GET", "/api/cart", None).await;
    let (_, second) = shop.send("GET", "/api/cart", None).await;
    assert!(first["cart"].get("_id").is_none());
    assert!(second["cart"].get("_id").is_none());

    let cart_id = shop.add_to_cart(shop.rice.id, 1).await;
    for _ in 0..2 {
        let (status, body) = shop.send("GET", "/api/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cart"]["_id"], cart_id);
    }

    let (_, body) = shop.send("DELETE", &format!("/api/cart/items/{}", shop.rice.id), None).await;
    assert_eq!(body["cart"]["_id"], cart_id);
    let (status, body) = shop.checkout(&cart_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn oversized_quantities_are_rejected() {
    let shop = Shop::open().await;
    let add = |product_id: Uuid, quantity: u64| json!({ "productId": product_id, "quantity": quantity });

    let (status, _) = shop.send("POST", "/api/cart/items", Some(add(shop.rice.id, 3_000_000_000))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = shop.send("GET", "/api/cart", None).await;
    assert!(body["cart"].get("_id").is_none());

    shop.add_to_cart(shop.rice.id, 2).await;
    let (status, _) = shop.send("POST", "/api/cart/items", Some(add(shop.soap.id, 3_000_000_000))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = shop.send("POST", "/api/cart/items", Some(add(shop.rice.id, u64::from(MAX_LINE_QUANTITY) - 1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = shop.send("PUT", &format!("/api/cart/items/{}", shop.rice.id), Some(json!({ "quantity": 3_000_000_000u64 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = shop.send("GET", "/api/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["itemCount"], 2);
    assert_eq!(body["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&body["cart"]["subtotal"]), Decimal::from(5_000));
}

#[tokio::test]
async fn cart_totals_follow_every_change() {
    let shop = Shop::open().await;
    shop.add_to_cart(shop.rice.id, 2).await;
    shop.add_to_cart(shop.rice.id, 1).await;
    let (status, body) = shop.send("POST", "/api/cart/items", Some(json!({ "productId": shop.soap.id, "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);

    let cart = &body["cart"];
    assert_eq!(cart["items"].as_array().unwrap().len(), 2);
    assert_eq!(cart["itemCount"], 5);
    assert_eq!(decimal(&cart["subtotal"]), Decimal::from(9_900));
    assert_eq!(decimal(&cart["shipping"]), Decimal::from(2_000));
    assert_eq!(decimal(&cart["tax"]), Decimal::new(742_50, 2));
    assert_eq!(decimal(&cart["total"]), Decimal::new(12_642_50, 2));
    assert_eq!(cart["items"][0]["productName"], "Rice 5kg");
    assert_eq!(cart["items"][0]["storeSlug"], "ikeja-foods");
    assert_eq!(decimal(&cart["items"][0]["subtotal"]), Decimal::from(7_500));

    let uri = format!("/api/cart/items/{}", shop.rice.id);
    let (_, body) = shop.send("PUT", &uri, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(decimal(&body["cart"]["subtotal"]), Decimal::from(4_900));

    let (_, body) = shop.send("DELETE", &uri, None).await;
    let cart = &body["cart"];
    assert_eq!(cart["itemCount"], 2);
    assert_eq!(decimal(&cart["subtotal"]), Decimal::from(2_400));
    assert_eq!(decimal(&cart["shipping"]), Decimal::from(1_000));
}

#[tokio::test]
async fn cart_mutation_errors() {
    let shop = Shop::open().await;

    let (status, body) = shop.send("POST", "/api/cart/items", Some(json!({ "productId": Uuid::now_v7(), "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, _) = shop.send("POST", "/api/cart/items", Some(json!({ "productId": shop.rice.id, "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = shop.send("PUT", &format!("/api/cart/items/{}", shop.rice.id), Some(json!({ "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart not found");

    shop.add_to_cart(shop.soap.id, 1).await;
    let (status, _) = shop.send("DELETE", &format!("/api/cart/items/{}", shop.rice.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_needs_no_session() {
    let shop = Shop::open().await;
    let (status, body) = common::send(shop.app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
