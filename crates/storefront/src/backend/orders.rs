//! Consumer order endpoints.

use bazaar_core::{OrderId, OrderTotals, PaymentMethod, ShippingAddress};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::{
    AccessToken, BackendClient, BackendError, CartItem, ListQuery, Order, Page, extract, normalize,
    segment,
};

/// Keys an order list may arrive under.
pub const ORDER_KEYS: [&str; 3] = ["orders", "items", "results"];

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct OrderRequest<'a> {
    pub items: &'a [CartItem],
    pub address: &'a ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Client-side totals; the backend recomputes its own.
    pub totals: &'a OrderTotals,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload<'a> {
    items: Vec<serde_json::Value>,
    shipping_address: &'a ShippingAddress,
    payment_method: &'static str,
    subtotal: String,
    shipping_charge: String,
    tax: String,
    total_amount: String,
}

impl OrderRequest<'_> {
    fn payload(&self) -> OrderPayload<'_> {
        OrderPayload {
            items: self
                .items
                .iter()
                .map(|item| {
                    json!({
                        "productId": item.product_id,
                        "quantity": item.quantity,
                        "price": item.price.amount.to_string(),
                    })
                })
                .collect(),
            shipping_address: self.address,
            payment_method: self.payment_method.as_str(),
            subtotal: self.totals.subtotal.amount.to_string(),
            shipping_charge: self.totals.shipping.amount.to_string(),
            tax: self.totals.tax.amount.to_string(),
            total_amount: self.totals.total.amount.to_string(),
        }
    }
}

impl BackendClient {
    /// Place an order and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingField`] when the response carries no
    /// recognizable order id.
    #[instrument(skip(self, token, request), fields(method = request.payment_method.as_str(), lines = request.items.len()))]
    pub async fn create_order(
        &self,
        token: &AccessToken,
        request: &OrderRequest<'_>,
    ) -> Result<OrderId, BackendError> {
        let body = serde_json::to_value(request.payload())?;
        let payload = self.post("/orders", Some(token), &body).await?;

        extract::order_id(&payload).ok_or_else(|| {
            tracing::error!(
                body = %payload.to_string().chars().take(500).collect::<String>(),
                "Order created but no order id found in response"
            );
            BackendError::MissingField("order id")
        })
    }

    /// Get the signed-in shopper's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_my_orders(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<Order>, BackendError> {
        let payload = self.get("/orders/my", Some(token), &query.to_pairs()).await?;
        Ok(normalize::page(&payload, &ORDER_KEYS, query.page.unwrap_or(1), |record| {
            normalize::order(record, self.images())
        }))
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the order does not exist or
    /// belongs to someone else.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &AccessToken, id: &OrderId) -> Result<Order, BackendError> {
        let path = format!("/orders/{}", segment(id.as_str())?);
        let payload = self.get(&path, Some(token), &[]).await?;
        normalize::order(&payload, self.images())
            .ok_or_else(|| BackendError::NotFound(format!("Order not found: {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CartItemId, Price, PricingRules, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_order_payload_shape() {
        let items = vec![CartItem {
            id: CartItemId::new("l1"),
            product_id: ProductId::new("p1"),
            name: "Teak Stool".to_owned(),
            image: String::new(),
            price: Price::inr(Decimal::from(150)),
            quantity: 2,
            available: true,
        }];
        let address = ShippingAddress {
            full_name: "Asha Rao".to_owned(),
            phone: "9876543210".to_owned(),
            line1: "12 MG Road".to_owned(),
            line2: String::new(),
            city: "Pune".to_owned(),
            state: "MH".to_owned(),
            postal_code: "411001".to_owned(),
            country: "India".to_owned(),
        };
        let totals = OrderTotals::compute(Decimal::from(300), &PricingRules::default());
        let request = OrderRequest {
            items: &items,
            address: &address,
            payment_method: PaymentMethod::Online,
            totals: &totals,
        };

        let body = serde_json::to_value(request.payload()).unwrap();
        assert_eq!(body["paymentMethod"], "ONLINE");
        assert_eq!(body["items"][0]["productId"], "p1");
        assert_eq!(body["items"][0]["quantity"], 2);
        let amount = |key: &str| body[key].as_str().unwrap().parse::<Decimal>().unwrap();
        assert_eq!(amount("totalAmount"), Decimal::from(403));
        assert_eq!(amount("shippingCharge"), Decimal::from(49));
        assert_eq!(body["shippingAddress"]["city"], "Pune");
    }
}
