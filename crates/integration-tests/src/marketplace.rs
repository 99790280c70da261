//! A small in-memory marketplace backend.
//!
//! Speaks the loosest dialect the storefront supports: mixed envelopes,
//! populated product references and Mongo-style `_id`s. Tokens can be
//! revoked mid-test to exercise the forced logout path, and cart reads can
//! be broken to exercise the cached snapshot fallback.
//!
//! The role of a signed-in account follows its email: `seller@...` signs in
//! as a seller (`s1`), `admin@...` as an admin (`a1`), anything else as a
//! customer (`u1`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::MockBackend;

/// Order id handed out by `POST /orders`.
pub const ORDER_ID: &str = "ord_1001";

/// Gateway order id handed out by `POST /payments/create-order`.
pub const GATEWAY_ORDER_ID: &str = "order_R1001";

/// Password the fake rejects.
pub const WRONG_PASSWORD: &str = "wrong-password";

/// Signature the fake refuses to verify.
pub const BAD_SIGNATURE: &str = "forged";

/// Id of the admin account.
pub const ADMIN_ID: &str = "a1";

/// Id of the customer account.
pub const CUSTOMER_ID: &str = "u1";

#[derive(Clone, Default)]
struct Shop {
    cart: Arc<Mutex<Vec<Value>>>,
    wishlist: Arc<Mutex<Vec<Value>>>,
    revoked: Arc<AtomicBool>,
    payments_revoked: Arc<AtomicBool>,
    cart_reads_fail: Arc<AtomicBool>,
}

impl Shop {
    fn lines(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn saved(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.wishlist.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `Err` with a 401 unless the request carries a live token.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer tok-"));
        if bearer && !self.revoked.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err((StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))).into_response())
        }
    }
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "p1",
            "pname": "Brass Lamp",
            "price": 1299,
            "mrp": 1599,
            "images": ["lamp.jpg"],
            "stock": 4,
            "category": {"name": "Decor"}
        }),
        json!({
            "_id": "p2",
            "pname": "Jute Rug",
            "price": 450,
            "images": [],
            "stock": 0
        }),
    ]
}

fn product(id: &str) -> Option<Value> {
    catalog().into_iter().find(|p| p["_id"] == id)
}

/// Handle to a running fake marketplace.
pub struct Marketplace {
    pub backend: MockBackend,
    shop: Shop,
}

impl Marketplace {
    pub async fn start() -> Self {
        let shop = Shop::default();
        let backend = MockBackend::start(routes(shop.clone())).await;
        Self { backend, shop }
    }

    /// Reject every token from now on.
    pub fn revoke_tokens(&self) {
        self.shop.revoked.store(true, Ordering::SeqCst);
    }

    /// Reject tokens on `POST /payments/create-order` only.
    pub fn revoke_payment_tokens(&self) {
        self.shop.payments_revoked.store(true, Ordering::SeqCst);
    }

    /// Answer `GET /cart` with a 500 from now on. Mutations still succeed.
    pub fn break_cart_reads(&self) {
        self.shop.cart_reads_fail.store(true, Ordering::SeqCst);
    }

    /// Put a product in the backend cart directly.
    pub fn seed_cart(&self, product_id: &str, quantity: u32) {
        if let Some(product) = product(product_id) {
            self.shop.lines().push(json!({
                "_id": format!("line-{product_id}"),
                "productId": product,
                "quantity": quantity,
            }));
        }
    }

    /// Number of lines in the backend cart.
    pub fn cart_len(&self) -> usize {
        self.shop.lines().len()
    }

    /// Quantity of the backend cart line holding `product_id`.
    pub fn cart_quantity(&self, product_id: &str) -> Option<u64> {
        self.shop
            .lines()
            .iter()
            .find(|line| line["productId"]["_id"] == product_id)
            .and_then(|line| line["quantity"].as_u64())
    }

    /// Save a product to the backend wishlist directly.
    pub fn seed_wishlist(&self, product_id: &str) {
        if let Some(product) = product(product_id) {
            self.shop.saved().push(product);
        }
    }

    /// Number of products in the backend wishlist.
    pub fn wishlist_len(&self) -> usize {
        self.shop.saved().len()
    }
}

fn routes(shop: Shop) -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({"name": "marketplace"})) }))
        .route("/auth/login", post(login))
        .route("/products", get(products))
        .route("/products/{id}", get(product_detail))
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", put(update_line).delete(remove_line))
        .route("/wishlist", get(wishlist).post(save_product))
        .route("/wishlist/{id}", delete(unsave_product))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(order_detail))
        .route("/payments/create-order", post(create_payment))
        .route("/payments/verify", post(verify_payment))
        .route("/payments/cancel", post(cancel_payment))
        .route("/seller/products", get(seller_products).post(accepted))
        .route("/seller/orders", get(no_orders))
        .route("/seller/orders/{id}/status", put(accepted))
        .route("/admin/users", get(users))
        .route("/admin/users/{id}/status", put(accepted))
        .with_state(shop)
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] == WRONG_PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})))
            .into_response();
    }
    let (id, role) = if email.starts_with("seller@") {
        ("s1", "seller")
    } else if email.starts_with("admin@") {
        (ADMIN_ID, "admin")
    } else {
        (CUSTOMER_ID, "customer")
    };
    Json(json!({
        "success": true,
        "token": format!("tok-{email}"),
        "user": {"_id": id, "name": "Asha Rao", "email": email, "role": role}
    }))
    .into_response()
}

async fn products(Query(params): Query<Vec<(String, String)>>) -> Json<Value> {
    let search = params
        .iter()
        .find(|(k, _)| k == "search")
        .map(|(_, v)| v.to_lowercase());
    let items: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| {
            search.as_deref().is_none_or(|s| {
                p["pname"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(s))
            })
        })
        .collect();
    Json(json!({"status": "success", "data": {"products": items, "page": 1, "totalPages": 1}}))
}

async fn product_detail(Path(id): Path<String>) -> Response {
    product(&id).map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({"message": "Product not found"}))).into_response(),
        |p| Json(json!({"product": p})).into_response(),
    )
}

async fn get_cart(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    if shop.cart_reads_fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "cart service down"})))
            .into_response();
    }
    let items = shop.lines().clone();
    Json(json!({"success": true, "data": {"items": items}})).into_response()
}

async fn add_to_cart(State(shop): State<Shop>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    let Some(product) = body["productId"].as_str().and_then(product) else {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Product not found"}))).into_response();
    };
    shop.lines().push(json!({
        "_id": format!("line-{}", product["_id"].as_str().unwrap_or_default()),
        "productId": product,
        "quantity": body["quantity"],
    }));
    // Mutation responses carry nothing the storefront reads
    Json(json!({"success": true, "message": "Added"})).into_response()
}

async fn clear_cart(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    shop.lines().clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn remove_line(State(shop): State<Shop>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    shop.lines().retain(|line| line["_id"] != id.as_str());
    Json(json!({"success": true})).into_response()
}

async fn update_line(
    State(shop): State<Shop>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    let mut lines = shop.lines();
    let Some(line) = lines.iter_mut().find(|line| line["_id"] == id.as_str()) else {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Cart item not found"}))).into_response();
    };
    line["quantity"] = body["quantity"].clone();
    Json(json!({"success": true})).into_response()
}

async fn wishlist(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    let items = shop.saved().clone();
    Json(json!({"wishlist": items})).into_response()
}

async fn save_product(State(shop): State<Shop>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    let Some(product) = body["productId"].as_str().and_then(product) else {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Product not found"}))).into_response();
    };
    let mut saved = shop.saved();
    if !saved.iter().any(|p| p["_id"] == product["_id"]) {
        saved.push(product);
    }
    Json(json!({"success": true})).into_response()
}

async fn unsave_product(State(shop): State<Shop>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    shop.saved().retain(|p| p["_id"] != id.as_str());
    Json(json!({"success": true})).into_response()
}

async fn create_order(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    (StatusCode::CREATED, Json(json!({"success": true, "order": {"_id": ORDER_ID}}))).into_response()
}

async fn order_detail(State(shop): State<Shop>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    if id != ORDER_ID {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Order not found"}))).into_response();
    }
    // Display-formatted prices, as some sellers' listings store them
    Json(json!({"order": {
        "_id": ORDER_ID,
        "orderStatus": "processing",
        "paymentMethod": "COD",
        "items": [{"productId": "p1", "name": "Brass Lamp", "price": "Rs. 1299", "quantity": 2}],
        "shippingAddress": {"fullName": "Asha Rao", "city": "Bengaluru", "postalCode": "560001"}
    }}))
    .into_response()
}

async fn create_payment(State(shop): State<Shop>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    if shop.payments_revoked.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))).into_response();
    }
    if body.get("amount").is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "amount is required"}))).into_response();
    }
    Json(json!({
        "razorpayOrder": {"id": GATEWAY_ORDER_ID, "amount": body["amount"], "currency": "INR"}
    }))
    .into_response()
}

async fn verify_payment(State(shop): State<Shop>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    if body["razorpay_signature"] == BAD_SIGNATURE {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "Payment verification failed"})))
            .into_response();
    }
    Json(json!({"success": true})).into_response()
}

async fn cancel_payment(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    Json(json!({"success": true})).into_response()
}

async fn seller_products(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    Json(json!({"products": catalog(), "totalPages": 1})).into_response()
}

async fn no_orders(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    Json(json!({"orders": []})).into_response()
}

async fn users(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    Json(json!({"users": [
        {"_id": ADMIN_ID, "name": "Admin", "email": "admin@example.com", "role": "admin"},
        {"_id": CUSTOMER_ID, "name": "Asha Rao", "email": "asha@example.com", "role": "customer"}
    ]}))
    .into_response()
}

/// Any mutation the tests only inspect through the request log.
async fn accepted(State(shop): State<Shop>, headers: HeaderMap) -> Response {
    if let Err(denied) = shop.authorize(&headers) {
        return denied;
    }
    Json(json!({"success": true})).into_response()
}
