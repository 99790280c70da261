//! Sign-in, cart and forced logout through the storefront's HTTP surface.

use bazaar_integration_tests::marketplace::{Marketplace, WRONG_PASSWORD};
use bazaar_integration_tests::{TestStorefront, location};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

const EMAIL: &str = "asha@example.com";

#[tokio::test]
async fn test_health() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;

    let response = store.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_guarded_page_redirects_to_login() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;

    let response = store.get("/cart").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login?next=%2Fcart");
    assert!(market.backend.log.matching(&Method::GET, "/cart").is_empty());
}

#[tokio::test]
async fn test_sign_in_lands_on_role_home() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;

    assert_eq!(store.sign_in(EMAIL, "hunter22").await, "/");

    let response = store
        .post_form(
            "/auth/login",
            &[("email", EMAIL), ("password", "hunter22"), ("next", "/wishlist")],
        )
        .await;
    assert_eq!(location(&response), "/wishlist");

    // Off-site destinations are ignored
    let response = store
        .post_form(
            "/auth/login",
            &[("email", EMAIL), ("password", "hunter22"), ("next", "//evil.example")],
        )
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_failed_sign_in_rerenders_form() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;

    let response = store
        .post_form("/auth/login", &[("email", EMAIL), ("password", WRONG_PASSWORD)])
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid email or password."));

    // Still signed out
    assert!(store.get("/cart").await.status().is_redirection());
}

#[tokio::test]
async fn test_add_to_cart_refetches() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in(EMAIL, "hunter22").await;

    let response = store
        .post_form("/cart/add", &[("product_id", "p1"), ("quantity", "2")])
        .await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/cart");

    let added = market.backend.log.matching(&Method::POST, "/cart");
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].body, json!({"productId": "p1", "quantity": 2}));
    assert_eq!(
        added[0].authorization.as_deref(),
        Some("Bearer tok-asha@example.com")
    );
    // One refetch after the mutation
    assert_eq!(market.backend.log.matching(&Method::GET, "/cart").len(), 1);

    let response = store.get("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Brass Lamp"));
    assert!(body.contains("Added to cart"));
}

#[tokio::test]
async fn test_revoked_token_forces_logout() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in(EMAIL, "hunter22").await;
    market.seed_cart("p1", 1);

    assert_eq!(store.get("/cart").await.status(), StatusCode::OK);

    market.revoke_tokens();
    let response = store.get("/cart").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login?next=%2Fcart");

    // The session is gone: the next visit never reaches the backend
    let cart_calls = market.backend.log.matching(&Method::GET, "/cart").len();
    let response = store.get("/cart").await;
    assert!(response.status().is_redirection());
    assert_eq!(
        market.backend.log.matching(&Method::GET, "/cart").len(),
        cart_calls
    );

    let body = store.get("/auth/login").await.text().await.unwrap();
    assert!(body.contains("Your session has expired. Please sign in again."));
}

#[tokio::test]
async fn test_revoked_token_on_form_post() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in(EMAIL, "hunter22").await;
    market.revoke_tokens();

    // Form posts land on the login page without a return path
    let response = store.post_form("/cart/add", &[("product_id", "p1")]).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_search_suggestions() {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;

    let short: Vec<Value> = store.get("/api/search?q=l").await.json().await.unwrap();
    assert!(short.is_empty());
    assert!(market.backend.log.matching(&Method::GET, "/products").is_empty());

    let found: Value = store.get("/api/search?q=lamp").await.json().await.unwrap();
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["id"], "p1");
    assert_eq!(found[0]["name"], "Brass Lamp");
    assert_eq!(found[0]["url"], "/products/p1");
}
