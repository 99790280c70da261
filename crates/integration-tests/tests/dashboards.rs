//! Seller and admin row actions: the backend call they make and where they
//! send the user afterwards.

use bazaar_integration_tests::marketplace::{ADMIN_ID, CUSTOMER_ID, Marketplace, ORDER_ID};
use bazaar_integration_tests::{TestStorefront, location};
use reqwest::{Method, StatusCode};
use serde_json::json;

async fn signed_in(email: &str) -> (Marketplace, TestStorefront) {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in(email, "hunter22").await;
    (market, store)
}

#[tokio::test]
async fn test_seller_creates_product() {
    let (market, store) = signed_in("seller@example.com").await;

    let response = store
        .post_form(
            "/seller/products",
            &[
                ("name", " Clay Vase "),
                ("description", "Hand thrown"),
                ("price", "499"),
                ("mrp", "599"),
                ("stock", "12"),
                ("category", "Decor"),
                ("image_url", ""),
            ],
        )
        .await;
    assert_eq!(location(&response), "/seller/products");

    let created = market.backend.log.matching(&Method::POST, "/seller/products");
    assert_eq!(created.len(), 1);
    let body = &created[0].body;
    assert_eq!(body["pname"], "Clay Vase");
    assert_eq!(body["name"], "Clay Vase");
    assert_eq!(body["price"], "499");
    assert_eq!(body["mrp"], "599");
    assert_eq!(body["stock"], 12);
    assert!(body.get("imageUrl").is_none());
    assert_eq!(
        created[0].authorization.as_deref(),
        Some("Bearer tok-seller@example.com")
    );

    let page = store.get("/seller/products").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("Product created and sent for approval"));
}

#[tokio::test]
async fn test_seller_invalid_product_is_rerendered() {
    let (market, store) = signed_in("seller@example.com").await;

    let response = store
        .post_form(
            "/seller/products",
            &[("name", "Clay Vase"), ("description", ""), ("price", "free"), ("stock", "1")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Clay Vase"));
    assert!(market.backend.log.matching(&Method::POST, "/seller/products").is_empty());
}

#[tokio::test]
async fn test_seller_updates_order_status() {
    let (market, store) = signed_in("seller@example.com").await;

    let response = store
        .post_form(
            &format!("/seller/orders/{ORDER_ID}/status"),
            &[("status", "Shipped")],
        )
        .await;
    assert_eq!(location(&response), "/seller/orders");

    let updates = market
        .backend
        .log
        .matching(&Method::PUT, &format!("/seller/orders/{ORDER_ID}/status"));
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].body, json!({"status": "shipped"}));
}

#[tokio::test]
async fn test_customer_cannot_reach_seller_actions() {
    let (market, store) = signed_in("asha@example.com").await;

    let response = store
        .post_form("/seller/products", &[("name", "Clay Vase"), ("price", "1"), ("stock", "1")])
        .await;
    assert_eq!(location(&response), "/");
    assert!(market.backend.log.matching(&Method::POST, "/seller/products").is_empty());
}

#[tokio::test]
async fn test_admin_blocks_user() {
    let (market, store) = signed_in("admin@example.com").await;

    let response = store
        .post_form(
            &format!("/admin/users/{CUSTOMER_ID}/status"),
            &[("status", "blocked")],
        )
        .await;
    assert_eq!(location(&response), "/admin/users");

    let updates = market
        .backend
        .log
        .matching(&Method::PUT, &format!("/admin/users/{CUSTOMER_ID}/status"));
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].body, json!({"status": "blocked", "isBlocked": true}));

    let page = store.get("/admin/users").await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("User blocked"));
}

#[tokio::test]
async fn test_admin_cannot_block_or_delete_self() {
    let (market, store) = signed_in("admin@example.com").await;

    let response = store
        .post_form(
            &format!("/admin/users/{ADMIN_ID}/status"),
            &[("status", "blocked")],
        )
        .await;
    assert_eq!(location(&response), "/admin/users");

    let response = store
        .post_form(&format!("/admin/users/{ADMIN_ID}/delete"), &[])
        .await;
    assert_eq!(location(&response), "/admin/users");

    let touched_self = market
        .backend
        .log
        .all()
        .into_iter()
        .any(|r| r.path.starts_with(&format!("/admin/users/{ADMIN_ID}")));
    assert!(!touched_self);

    let page = store.get("/admin/users").await.text().await.unwrap();
    assert!(page.contains("You cannot change your own account status."));
    assert!(page.contains("You cannot delete your own account."));
}
