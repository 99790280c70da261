//! The checkout wizard end to end: shipping, payment, review, placement and
//! the online payment callbacks.

use bazaar_integration_tests::marketplace::{
    BAD_SIGNATURE, GATEWAY_ORDER_ID, Marketplace, ORDER_ID,
};
use bazaar_integration_tests::{TEST_RAZORPAY_KEY, TestStorefront, location};
use reqwest::{Method, StatusCode};

const ADDRESS: [(&str, &str); 7] = [
    ("full_name", "Asha Rao"),
    ("phone", "+91 98765-43210"),
    ("line1", "12 MG Road"),
    ("city", "Bengaluru"),
    ("state", "Karnataka"),
    ("postal_code", "560001"),
    ("country", "India"),
];

/// Signed-in shopper with one lamp in the cart.
async fn shopper() -> (Marketplace, TestStorefront) {
    let market = Marketplace::start().await;
    let store = TestStorefront::start(&market.backend).await;
    store.sign_in("asha@example.com", "hunter22").await;
    market.seed_cart("p1", 1);
    (market, store)
}

/// Complete shipping and payment, ending on the review step.
async fn reach_review(store: &TestStorefront, method: &str) {
    let response = store.post_form("/checkout/shipping", &ADDRESS).await;
    assert_eq!(location(&response), "/checkout/payment");

    let response = store
        .post_form("/checkout/payment", &[("payment_method", method)])
        .await;
    assert_eq!(location(&response), "/checkout/review");
}

#[tokio::test]
async fn test_steps_cannot_be_skipped() {
    let (_market, store) = shopper().await;

    let response = store.get("/checkout/review").await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/checkout/shipping");

    let response = store
        .post_form("/checkout/payment", &[("payment_method", "cod")])
        .await;
    assert_eq!(location(&response), "/checkout/shipping");
}

#[tokio::test]
async fn test_invalid_address_is_rerendered() {
    let (_market, store) = shopper().await;

    let mut address = ADDRESS.to_vec();
    address[5] = ("postal_code", "5600");
    let response = store.post_form("/checkout/shipping", &address).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("Postal code must be 6 digits"));
    assert!(body.contains("12 MG Road"));
}

#[tokio::test]
async fn test_cash_on_delivery() {
    let (market, store) = shopper().await;
    reach_review(&store, "cod").await;

    let review = store.get("/checkout/review").await;
    assert_eq!(review.status(), StatusCode::OK);
    let body = review.text().await.unwrap();
    assert!(body.contains("Brass Lamp"));
    assert!(body.contains("9876543210"));

    let response = store.post_form("/checkout/place", &[]).await;
    assert_eq!(location(&response), format!("/checkout/success/{ORDER_ID}"));

    let orders = market.backend.log.matching(&Method::POST, "/orders");
    assert_eq!(orders.len(), 1);
    let order = &orders[0].body;
    assert_eq!(order["paymentMethod"], "COD");
    assert_eq!(order["items"][0]["productId"], "p1");
    assert_eq!(order["shippingAddress"]["phone"], "9876543210");

    // Cash on delivery needs no gateway and empties the cart
    assert!(market.backend.log.matching(&Method::POST, "/payments/create-order").is_empty());
    assert_eq!(market.cart_len(), 0);
}

#[tokio::test]
async fn test_order_detail_renders_line_totals() {
    let (_market, store) = shopper().await;

    let response = store.get(&format!("/account/orders/{ORDER_ID}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Brass Lamp"));
    assert!(body.contains("₹1299.00"));
    assert!(body.contains("₹2598.00"));

    let response = store.get("/account/orders/ord_missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_online_payment_verified() {
    let (market, store) = shopper().await;
    reach_review(&store, "online").await;

    let response = store.post_form("/checkout/place", &[]).await;
    assert_eq!(location(&response), format!("/checkout/pay/{ORDER_ID}"));
    // The cart is kept until the payment is confirmed
    assert_eq!(market.cart_len(), 1);

    let pay = store.get(&format!("/checkout/pay/{ORDER_ID}")).await;
    assert_eq!(pay.status(), StatusCode::OK);
    let body = pay.text().await.unwrap();
    assert!(body.contains(GATEWAY_ORDER_ID));
    assert!(body.contains(TEST_RAZORPAY_KEY));

    let response = store
        .post_form(
            "/checkout/payment/verify",
            &[
                ("order_id", ORDER_ID),
                ("razorpay_order_id", GATEWAY_ORDER_ID),
                ("razorpay_payment_id", "pay_P1"),
                ("razorpay_signature", "valid-signature"),
            ],
        )
        .await;
    assert_eq!(location(&response), format!("/checkout/success/{ORDER_ID}"));

    let verified = market.backend.log.matching(&Method::POST, "/payments/verify");
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].body["orderId"], ORDER_ID);
    assert_eq!(verified[0].body["razorpay_payment_id"], "pay_P1");
    assert_eq!(market.cart_len(), 0);

    // The pending payment is consumed
    let response = store.get(&format!("/checkout/pay/{ORDER_ID}")).await;
    assert_eq!(location(&response), format!("/account/orders/{ORDER_ID}"));
}

#[tokio::test]
async fn test_online_payment_rejected_signature() {
    let (market, store) = shopper().await;
    reach_review(&store, "online").await;
    store.post_form("/checkout/place", &[]).await;

    let response = store
        .post_form(
            "/checkout/payment/verify",
            &[
                ("order_id", ORDER_ID),
                ("razorpay_order_id", GATEWAY_ORDER_ID),
                ("razorpay_payment_id", "pay_P1"),
                ("razorpay_signature", BAD_SIGNATURE),
            ],
        )
        .await;

    assert_eq!(location(&response), format!("/account/orders/{ORDER_ID}"));
    assert_eq!(market.cart_len(), 1);
}

#[tokio::test]
async fn test_online_payment_dismissed() {
    let (market, store) = shopper().await;
    reach_review(&store, "online").await;
    store.post_form("/checkout/place", &[]).await;

    let response = store
        .post_form("/checkout/payment/cancel", &[("order_id", ORDER_ID)])
        .await;
    assert_eq!(location(&response), format!("/account/orders/{ORDER_ID}"));

    let cancelled = market.backend.log.matching(&Method::POST, "/payments/cancel");
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].body["orderId"], ORDER_ID);
    assert_eq!(cancelled[0].body["razorpayOrderId"], GATEWAY_ORDER_ID);
}

#[tokio::test]
async fn test_payment_setup_token_rejection_forces_logout() {
    let (market, store) = shopper().await;
    reach_review(&store, "online").await;
    market.revoke_payment_tokens();

    let response = store.post_form("/checkout/place", &[]).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login");

    // The order went through before the gateway refused the token
    assert_eq!(market.backend.log.matching(&Method::POST, "/orders").len(), 1);
    assert_eq!(
        market.backend.log.matching(&Method::POST, "/payments/create-order").len(),
        1
    );

    let response = store.get("/account").await;
    assert_eq!(location(&response), "/auth/login?next=%2Faccount");
}
