//! Online payment endpoints (Razorpay via the backend).
//!
//! The backend's create-payment contract is not pinned down, so intent
//! creation tries a fixed sequence of request bodies until one is accepted.

use bazaar_core::{OrderId, Price};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::{AccessToken, BackendClient, BackendError, PaymentCallback, PaymentIntent, normalize};

/// Request body shapes tried, in order, when creating a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentPayloadShape {
    /// `{orderId}`
    CamelOrderId,
    /// `{order_id}`
    SnakeOrderId,
    /// `{orderId, amount}` with the amount in paise
    OrderIdWithAmount,
    /// `{amount, currency, receipt}`, a bare Razorpay order
    GatewayOrder,
}

/// Probe order for payment-intent creation.
pub const INTENT_PAYLOAD_SHAPES: [IntentPayloadShape; 4] = [
    IntentPayloadShape::CamelOrderId,
    IntentPayloadShape::SnakeOrderId,
    IntentPayloadShape::OrderIdWithAmount,
    IntentPayloadShape::GatewayOrder,
];

impl IntentPayloadShape {
    /// Build the request body for this shape.
    #[must_use]
    pub fn body(self, order_id: &OrderId, amount_minor: i64, currency: &str) -> Value {
        match self {
            Self::CamelOrderId => json!({ "orderId": order_id }),
            Self::SnakeOrderId => json!({ "order_id": order_id }),
            Self::OrderIdWithAmount => json!({ "orderId": order_id, "amount": amount_minor }),
            Self::GatewayOrder => json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": format!("receipt_{order_id}"),
            }),
        }
    }
}

impl BackendClient {
    /// Create a payment intent for a placed order.
    ///
    /// Tries each of [`INTENT_PAYLOAD_SHAPES`] in turn. Validation-style
    /// rejections move on to the next shape; auth failures, rate limiting
    /// and transport errors are returned immediately.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ProbeExhausted`] when every shape is rejected.
    #[instrument(skip(self, token), fields(order_id = %order_id, amount = %amount))]
    pub async fn create_payment_intent(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
        amount: Price,
    ) -> Result<PaymentIntent, BackendError> {
        let amount_minor = amount
            .minor_units()
            .ok_or(BackendError::MissingField("payable amount"))?;
        let currency = amount.currency_code.code();

        let mut last = String::new();
        for (attempt, shape) in INTENT_PAYLOAD_SHAPES.iter().enumerate() {
            let body = shape.body(order_id, amount_minor, currency);

            let result = match self.post("/payments/create-order", Some(token), &body).await {
                Ok(payload) => {
                    normalize::payment_intent(&payload, self.razorpay_key_id(), amount_minor)
                        .ok_or(BackendError::MissingField("razorpay order id"))
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(intent) => {
                    info!(attempt, shape = ?shape, gateway_order_id = %intent.gateway_order_id, "Payment intent created");
                    return Ok(intent);
                }
                Err(e) if e.is_probe_advance() => {
                    warn!(attempt, shape = ?shape, error = %e, "Payment intent shape rejected, trying next");
                    last = e.to_string();
                }
                Err(e) => return Err(e),
            }
        }

        Err(BackendError::ProbeExhausted {
            attempts: INTENT_PAYLOAD_SHAPES.len(),
            last,
        })
    }

    /// Verify a completed payment with the backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Rejected`] when the signature does not verify.
    #[instrument(skip(self, token, callback), fields(order_id = %order_id, gateway_order_id = %callback.razorpay_order_id))]
    pub async fn verify_payment(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
        callback: &PaymentCallback,
    ) -> Result<(), BackendError> {
        let body = json!({
            "orderId": order_id,
            "razorpay_order_id": callback.razorpay_order_id,
            "razorpay_payment_id": callback.razorpay_payment_id,
            "razorpay_signature": callback.razorpay_signature,
        });
        self.post("/payments/verify", Some(token), &body).await?;
        Ok(())
    }

    /// Tell the backend the shopper abandoned the payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; callers treat this as
    /// best-effort.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn cancel_payment(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
        gateway_order_id: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut body = json!({ "orderId": order_id });
        if let (Some(gateway_order_id), Some(map)) = (gateway_order_id, body.as_object_mut()) {
            map.insert("razorpayOrderId".to_owned(), json!(gateway_order_id));
        }
        self.post("/payments/cancel", Some(token), &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_payload_shapes() {
        let id = OrderId::new("o1");
        let bodies: Vec<Value> = INTENT_PAYLOAD_SHAPES
            .iter()
            .map(|shape| shape.body(&id, 40300, "INR"))
            .collect();

        assert_eq!(bodies[0], json!({"orderId": "o1"}));
        assert_eq!(bodies[1], json!({"order_id": "o1"}));
        assert_eq!(bodies[2], json!({"orderId": "o1", "amount": 40300}));
        assert_eq!(
            bodies[3],
            json!({"amount": 40300, "currency": "INR", "receipt": "receipt_o1"})
        );
    }
}
