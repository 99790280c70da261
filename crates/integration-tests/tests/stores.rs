//! Cart and wishlist mutations: each goes to the backend, then refetches,
//! falling back to a locally patched snapshot when the refetch fails.

use bazaar_integration_tests::marketplace::Marketplace;
use bazaar_integration_tests::{TestStorefront, location};
use reqwest::{Method, StatusCode};
use serde_json::json;

const EMAIL: &str = "asha@example.com";

async fn signed_in() -> (Marketplace, TestStorefront) {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in(EMAIL, "hunter22").await;
    (market, store)
}

#[tokio::test]
async fn test_update_quantity() {
    let (market, store) = signed_in().await;
    market.seed_cart("p1", 1);

    let response = store
        .post_form("/cart/update", &[("item_id", "line-p1"), ("quantity", "3")])
        .await;
    assert_eq!(location(&response), "/cart");

    let updates = market.backend.log.matching(&Method::PUT, "/cart/line-p1");
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].body, json!({"quantity": 3}));
    assert_eq!(market.cart_quantity("p1"), Some(3));

    let body = store.get("/cart").await.text().await.unwrap();
    assert!(body.contains(r#"value="3""#));
    assert!(body.contains("Cart updated"));
}

#[tokio::test]
async fn test_zero_quantity_removes_line() {
    let (market, store) = signed_in().await;
    market.seed_cart("p1", 2);

    store
        .post_form("/cart/update", &[("item_id", "line-p1"), ("quantity", "0")])
        .await;

    assert_eq!(market.backend.log.matching(&Method::DELETE, "/cart/line-p1").len(), 1);
    assert!(market.backend.log.matching(&Method::PUT, "/cart/line-p1").is_empty());
    assert_eq!(market.cart_len(), 0);
}

#[tokio::test]
async fn test_remove_patches_snapshot_when_refetch_fails() {
    let (market, store) = signed_in().await;
    market.seed_cart("p1", 1);
    market.seed_cart("p2", 1);
    let body = store.get("/cart").await.text().await.unwrap();
    assert!(body.contains("Brass Lamp"));

    market.break_cart_reads();
    let response = store
        .post_form("/cart/remove", &[("item_id", "line-p1")])
        .await;
    assert_eq!(location(&response), "/cart");
    assert_eq!(market.backend.log.matching(&Method::DELETE, "/cart/line-p1").len(), 1);
    assert_eq!(market.cart_len(), 1);

    // The page falls back to the cached snapshot, without the removed line
    let response = store.get("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Showing what we had last"));
    assert!(body.contains("Jute Rug"));
    assert!(!body.contains("Brass Lamp"));
}

#[tokio::test]
async fn test_path_ids_are_encoded() {
    let (market, store) = signed_in().await;

    store
        .post_form("/cart/remove", &[("item_id", "../orders/x")])
        .await;

    assert!(market.backend.log.matching(&Method::DELETE, "/orders/x").is_empty());
    assert_eq!(
        market.backend.log.matching(&Method::DELETE, "/cart/..%2Forders%2Fx").len(),
        1
    );
}

#[tokio::test]
async fn test_wishlist_toggle() {
    let (market, store) = signed_in().await;

    let response = store
        .post_form("/wishlist/toggle", &[("product_id", "p1")])
        .await;
    assert_eq!(location(&response), "/wishlist");
    let saved = market.backend.log.matching(&Method::POST, "/wishlist");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].body, json!({"productId": "p1"}));
    assert_eq!(market.wishlist_len(), 1);

    let body = store.get("/wishlist").await.text().await.unwrap();
    assert!(body.contains("Brass Lamp"));
    assert!(body.contains("Saved to your wishlist"));

    // Saved now, so the same toggle removes it
    store
        .post_form("/wishlist/toggle", &[("product_id", "p1")])
        .await;
    assert_eq!(market.backend.log.matching(&Method::DELETE, "/wishlist/p1").len(), 1);
    assert_eq!(market.wishlist_len(), 0);
}

#[tokio::test]
async fn test_move_to_cart() {
    let (market, store) = signed_in().await;
    market.seed_wishlist("p1");

    let response = store
        .post_form("/wishlist/move-to-cart", &[("product_id", "p1")])
        .await;
    assert_eq!(location(&response), "/wishlist");

    let added = market.backend.log.matching(&Method::POST, "/cart");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].body, json!({"productId": "p1", "quantity": 1}));
    assert_eq!(market.backend.log.matching(&Method::DELETE, "/wishlist/p1").len(), 1);
    assert_eq!(market.cart_len(), 1);
    assert_eq!(market.wishlist_len(), 0);

    let body = store.get("/wishlist").await.text().await.unwrap();
    assert!(body.contains("Moved to your cart"));
}
