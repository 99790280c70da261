//! Payment intent creation against backends that accept different request
//! bodies.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::post};
use bazaar_core::{OrderId, Price};
use bazaar_integration_tests::{MockBackend, TEST_RAZORPAY_KEY};
use bazaar_storefront::backend::{AccessToken, BackendError, INTENT_PAYLOAD_SHAPES};
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::{Value, json};

const CREATE_ORDER: &str = "/payments/create-order";

fn amount() -> Price {
    Price::inr(Decimal::new(403, 0))
}

fn gateway_order(amount: &Value) -> Value {
    json!({
        "success": true,
        "razorpayOrder": { "id": "order_R1", "amount": amount, "currency": "INR" }
    })
}

#[tokio::test]
async fn test_probe_advances_past_validation_errors() {
    let backend = MockBackend::start(Router::new().route(
        CREATE_ORDER,
        post(|Json(body): Json<Value>| async move {
            match (body.get("orderId"), body.get("amount")) {
                (Some(_), Some(amount)) => Json(gateway_order(amount)).into_response(),
                _ => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"message": "orderId and amount are required"})),
                )
                    .into_response(),
            }
        }),
    ))
    .await;

    let intent = backend
        .client()
        .create_payment_intent(&AccessToken::new("t"), &OrderId::new("o1"), amount())
        .await
        .unwrap();

    assert_eq!(intent.gateway_order_id, "order_R1");
    assert_eq!(intent.amount_minor, 40_300);
    assert_eq!(intent.key_id, TEST_RAZORPAY_KEY);
    assert_eq!(intent.amount(), amount());

    let attempts = backend.log.matching(&Method::POST, CREATE_ORDER);
    let bodies: Vec<&Value> = attempts.iter().map(|r| &r.body).collect();
    assert_eq!(
        bodies,
        [
            &json!({"orderId": "o1"}),
            &json!({"order_id": "o1"}),
            &json!({"orderId": "o1", "amount": 40_300}),
        ]
    );
}

#[tokio::test]
async fn test_probe_advances_past_unusable_success() {
    let backend = MockBackend::start(Router::new().route(
        CREATE_ORDER,
        post(|Json(body): Json<Value>| async move {
            if body.get("order_id").is_some() {
                Json(json!({"razorpayOrderId": "order_S2", "key": "rzp_live_backend"}))
            } else {
                // Accepted, but nothing the widget could open
                Json(json!({"success": true, "message": "ok"}))
            }
        }),
    ))
    .await;

    let intent = backend
        .client()
        .create_payment_intent(&AccessToken::new("t"), &OrderId::new("o2"), amount())
        .await
        .unwrap();

    assert_eq!(intent.gateway_order_id, "order_S2");
    assert_eq!(intent.key_id, "rzp_live_backend");
    assert_eq!(intent.amount_minor, 40_300);
    assert_eq!(backend.log.matching(&Method::POST, CREATE_ORDER).len(), 2);
}

#[tokio::test]
async fn test_probe_stops_on_auth_failure() {
    let backend = MockBackend::start(Router::new().route(
        CREATE_ORDER,
        post(|| async { StatusCode::UNAUTHORIZED }),
    ))
    .await;

    let err = backend
        .client()
        .create_payment_intent(&AccessToken::new("expired"), &OrderId::new("o3"), amount())
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Unauthorized));
    assert_eq!(backend.log.matching(&Method::POST, CREATE_ORDER).len(), 1);
}

#[tokio::test]
async fn test_probe_reports_exhaustion() {
    let backend = MockBackend::start(Router::new().route(
        CREATE_ORDER,
        post(|| async {
            (StatusCode::BAD_REQUEST, Json(json!({"error": {"message": "unsupported payload"}})))
        }),
    ))
    .await;

    let err = backend
        .client()
        .create_payment_intent(&AccessToken::new("t"), &OrderId::new("o4"), amount())
        .await
        .unwrap_err();

    match err {
        BackendError::ProbeExhausted { attempts, last } => {
            assert_eq!(attempts, INTENT_PAYLOAD_SHAPES.len());
            assert!(last.contains("unsupported payload"), "last error was {last}");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(
        backend.log.matching(&Method::POST, CREATE_ORDER).len(),
        INTENT_PAYLOAD_SHAPES.len()
    );
}
