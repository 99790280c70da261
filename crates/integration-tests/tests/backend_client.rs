//! Backend client against a mock marketplace API.
//!
//! Covers envelope unwrapping, response shape probing, image resolution and
//! status mapping end to end over HTTP.

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bazaar_core::ProductId;
use bazaar_integration_tests::MockBackend;
use bazaar_storefront::backend::{AccessToken, BackendError, ListQuery, PLACEHOLDER_IMAGE};
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn test_cart_lines_from_success_envelope() {
    let backend = MockBackend::start(Router::new().route(
        "/cart",
        get(|| async {
            Json(json!({
                "success": true,
                "data": {
                    "cartItems": [
                        {
                            "_id": "line-1",
                            "productId": {
                                "_id": "p1",
                                "pname": "Brass Lamp",
                                "price": 1299,
                                "images": ["lamp.jpg"],
                                "stock": 4
                            },
                            "quantity": 2
                        },
                        { "productId": "p2", "name": "Jute Rug", "price": "450.50", "qty": 0 }
                    ]
                }
            }))
        }),
    ))
    .await;

    let cart = backend
        .client()
        .get_cart(&AccessToken::new("token-1"))
        .await
        .unwrap();

    assert_eq!(cart.len(), 2);
    assert_eq!(cart[0].id.as_str(), "line-1");
    assert_eq!(cart[0].product_id.as_str(), "p1");
    assert_eq!(cart[0].name, "Brass Lamp");
    assert_eq!(cart[0].quantity, 2);
    assert_eq!(cart[0].price.amount, Decimal::from(1299));
    assert_eq!(cart[0].image, format!("{}/uploads/lamp.jpg", backend.base_url));
    assert!(cart[0].available);

    // No line id: the product id stands in. Quantity never drops below 1.
    assert_eq!(cart[1].id.as_str(), "p2");
    assert_eq!(cart[1].quantity, 1);
    assert_eq!(cart[1].price.amount, Decimal::new(45_050, 2));
    assert_eq!(cart[1].image, PLACEHOLDER_IMAGE);

    let sent = backend.log.matching(&Method::GET, "/cart");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer token-1"));
}

#[tokio::test]
async fn test_products_from_status_envelope() {
    let backend = MockBackend::start(Router::new().route(
        "/products",
        get(|| async {
            Json(json!({
                "status": "success",
                "data": {
                    "products": [
                        { "id": 7, "title": "Clay Pot", "sellingPrice": 249, "imageUrl": "https://cdn.example/pot.png" }
                    ],
                    "page": 1,
                    "totalPages": 3
                }
            }))
        }),
    ))
    .await;

    let page = backend
        .client()
        .get_products(&ListQuery::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, ProductId::new("7"));
    assert_eq!(page.items[0].name, "Clay Pot");
    assert_eq!(page.items[0].image, "https://cdn.example/pot.png");
}

#[tokio::test]
async fn test_status_mapping() {
    let backend = MockBackend::start(
        Router::new()
            .route(
                "/cart",
                get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))) }),
            )
            .route(
                "/wishlist",
                get(|| async { (StatusCode::FORBIDDEN, Json(json!({"message": "blocked"}))) }),
            )
            .route(
                "/orders",
                post(|| async {
                    // 200 with a failed envelope still counts as a rejection
                    Json(json!({"success": false, "message": "Cart is empty"}))
                }),
            )
            .route(
                "/auth/me",
                get(|| async {
                    (StatusCode::TOO_MANY_REQUESTS, [("Retry-After", "7")], "slow down")
                        .into_response()
                }),
            ),
    )
    .await;
    let client = backend.client();
    let token = AccessToken::new("stale");

    let err = client.get_cart(&token).await.unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized));
    assert!(err.is_auth_failure());

    let err = client.get_wishlist(&token).await.unwrap_err();
    assert!(matches!(err, BackendError::Forbidden(ref m) if m == "blocked"));
    assert!(err.is_auth_failure());

    let err = client.me(&token).await.unwrap_err();
    assert!(matches!(err, BackendError::RateLimited(7)));
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn test_failed_envelope_is_rejected() {
    let backend = MockBackend::start(Router::new().route(
        "/auth/login",
        post(|| async { Json(json!({"success": false, "message": "Invalid credentials"})) }),
    ))
    .await;

    let err = backend
        .client()
        .login("asha@example.com", "wrong-password")
        .await
        .unwrap_err();

    assert!(
        matches!(err, BackendError::Rejected { status: 200, ref message } if message == "Invalid credentials")
    );
}

#[tokio::test]
async fn test_login_fetches_profile_when_missing() {
    let backend = MockBackend::start(
        Router::new()
            .route("/auth/login", post(|| async { Json(json!({"accessToken": "abc"})) }))
            .route(
                "/auth/me",
                get(|| async {
                    Json(json!({"user": {"_id": "u9", "name": "Ravi", "email": "ravi@example.com", "role": "vendor"}}))
                }),
            ),
    )
    .await;

    let login = backend
        .client()
        .login("ravi@example.com", "secret1")
        .await
        .unwrap();

    assert_eq!(login.token.expose(), "abc");
    assert_eq!(login.profile.id.as_str(), "u9");
    assert_eq!(login.profile.role.home_path(), "/seller");

    let me = backend.log.matching(&Method::GET, "/auth/me");
    assert_eq!(me.len(), 1);
    assert_eq!(me[0].authorization.as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn test_ping() {
    let backend = MockBackend::start(Router::new().route("/", get(|| async { "marketplace api" })))
        .await;
    assert_eq!(backend.client().ping().await.unwrap(), 200);

    let broken = MockBackend::start(Router::new().route(
        "/",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    assert!(broken.client().ping().await.is_err());
}
