//! Domain types for the marketplace backend.
//!
//! These are the storefront's canonical shapes. The backend's own payloads
//! vary from endpoint to endpoint; [`super::normalize`] maps them onto these.

use std::fmt;

use bazaar_core::{
    AccountStatus, ApprovalStatus, CartItemId, CurrencyCode, OrderId, OrderStatus, PaymentMethod,
    PaymentStatus, Price, ProductId, Role, SellerId, ShippingAddress, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth Types
// =============================================================================

/// JWT issued by the backend, sent as a bearer token.
///
/// Implements `Debug` manually so the token never reaches the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Profile of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: AccessToken,
    pub profile: AccountProfile,
}

/// Registration request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A product as shown in listings and on the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// List price before discount, when the backend provides one.
    pub mrp: Option<Price>,
    /// Primary image, already resolved to a displayable URL.
    pub image: String,
    /// All images, resolved.
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub seller_name: Option<String>,
    pub approval: ApprovalStatus,
}

/// Stock level below which the product page warns the shopper.
const LOW_STOCK: u32 = 5;

impl Product {
    /// Whether the product can be added to a cart.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|stock| stock > 0)
    }

    /// Remaining stock when it is running low.
    #[must_use]
    pub fn low_stock(&self) -> Option<u32> {
        self.stock.filter(|stock| (1..LOW_STOCK).contains(stock))
    }

    /// Discount percentage against the list price, if any.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let mrp = self.mrp?;
        if mrp.amount <= self.price.amount || mrp.amount.is_zero() {
            return None;
        }
        let off = (mrp.amount - self.price.amount) * Decimal::ONE_HUNDRED / mrp.amount;
        u32::try_from(off.round()).ok()
    }
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    pub total_pages: u32,
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// A single page holding everything.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            page: 1,
            total_pages: 1,
            total: None,
        }
    }

    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Listing parameters forwarded to the backend as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    /// Query pairs with blank values dropped.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        for (key, value) in [
            ("search", &self.search),
            ("category", &self.category),
            ("sort", &self.sort),
            ("status", &self.status),
        ] {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_owned()));
            }
        }
        pairs
    }
}

// =============================================================================
// Cart & Wishlist Types
// =============================================================================

/// One line of the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart line id (falls back to the product id when the backend has none).
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub available: bool,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// One saved product in the wishlist, keyed by product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    pub available: bool,
}

// =============================================================================
// Order & Payment Types
// =============================================================================

/// A line on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub image: String,
    pub price: Price,
    pub quantity: u32,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A placed order, as listed in account and dashboard tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total: Price,
    /// Creation timestamp as the backend sent it, shortened to the date.
    pub placed_on: String,
    pub customer_name: Option<String>,
    pub lines: Vec<OrderLine>,
    pub address: Option<ShippingAddress>,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Gateway order created for an online payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Razorpay order id (`order_...`).
    pub gateway_order_id: String,
    /// Amount in minor units (paise).
    pub amount_minor: i64,
    pub currency: String,
    /// Publishable key id for the checkout widget.
    pub key_id: String,
}

impl PaymentIntent {
    /// The amount as a price, for display next to the widget.
    #[must_use]
    pub fn amount(&self) -> Price {
        Price::new(
            Decimal::new(self.amount_minor, 2),
            CurrencyCode::parse(&self.currency).unwrap_or_default(),
        )
    }
}

/// Fields posted back by the payment widget's success handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentCallback {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

// =============================================================================
// Dashboard Types
// =============================================================================

/// A user row in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub joined_on: String,
}

/// A seller row in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerRecord {
    pub id: SellerId,
    pub name: String,
    pub email: String,
    pub shop_name: String,
    pub approval: ApprovalStatus,
    pub product_count: Option<u32>,
}

/// Headline numbers for a seller's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerStats {
    pub products: u64,
    pub orders: u64,
    pub pending_orders: u64,
    pub revenue: Price,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub users: u64,
    pub sellers: u64,
    pub products: u64,
    pub orders: u64,
    pub revenue: Price,
    pub recent_orders: Vec<Order>,
}

/// Editable fields of a seller's product, as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub mrp: String,
    pub stock: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
}

/// Why a [`ProductDraft`] cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductDraftError {
    #[error("product name is required")]
    MissingName,
    #[error("price must be a positive amount")]
    InvalidPrice,
    #[error("MRP must be an amount no lower than the price")]
    InvalidMrp,
    #[error("stock must be a whole number")]
    InvalidStock,
}

/// A validated product, ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Prefill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount.to_string(),
            mrp: product.mrp.map(|m| m.amount.to_string()).unwrap_or_default(),
            stock: product.stock.map(|s| s.to_string()).unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            image_url: product
                .images
                .first()
                .filter(|url| !url.starts_with("/static/"))
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Check the form and parse its numbers.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in form order.
    pub fn validate(&self) -> Result<ProductInput, ProductDraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProductDraftError::MissingName);
        }

        let price = self
            .price
            .trim()
            .parse::<Decimal>()
            .ok()
            .filter(|p| p.is_sign_positive() && !p.is_zero())
            .ok_or(ProductDraftError::InvalidPrice)?;

        let mrp = match self.mrp.trim() {
            "" => None,
            raw => Some(
                raw.parse::<Decimal>()
                    .ok()
                    .filter(|m| *m >= price)
                    .ok_or(ProductDraftError::InvalidMrp)?,
            ),
        };

        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw.parse::<u32>().map_err(|_| ProductDraftError::InvalidStock)?,
        };

        Ok(ProductInput {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            mrp,
            stock,
            category: self.category.trim().to_owned(),
            image_url: Some(self.image_url.trim())
                .filter(|url| !url.is_empty())
                .map(str::to_owned),
        })
    }
}

impl ProductInput {
    /// Request body for create and update. The name is sent under both
    /// spellings the backend has used.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "pname": self.name,
            "name": self.name,
            "description": self.description,
            "price": self.price.to_string(),
            "stock": self.stock,
            "category": self.category,
        });
        if let Some(map) = body.as_object_mut() {
            if let Some(mrp) = self.mrp {
                map.insert("mrp".to_owned(), serde_json::Value::String(mrp.to_string()));
            }
            if let Some(url) = &self.image_url {
                map.insert("imageUrl".to_owned(), serde_json::Value::String(url.clone()));
            }
        }
        body
    }
}

/// One key/value site setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSetting {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(price: &str, mrp: &str, stock: &str) -> ProductDraft {
        ProductDraft {
            name: " Handloom Saree ".to_owned(),
            price: price.to_owned(),
            mrp: mrp.to_owned(),
            stock: stock.to_owned(),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_product_draft_validation() {
        let input = draft("1299.50", "1500", "4").validate().unwrap();
        assert_eq!(input.name, "Handloom Saree");
        assert_eq!(input.price, Decimal::new(129_950, 2));
        assert_eq!(input.mrp, Some(Decimal::from(1500)));
        assert_eq!(input.stock, 4);
        assert_eq!(input.image_url, None);

        assert_eq!(draft("0", "", "").validate(), Err(ProductDraftError::InvalidPrice));
        assert_eq!(draft("abc", "", "").validate(), Err(ProductDraftError::InvalidPrice));
        assert_eq!(draft("100", "90", "").validate(), Err(ProductDraftError::InvalidMrp));
        assert_eq!(draft("100", "", "-1").validate(), Err(ProductDraftError::InvalidStock));
        assert_eq!(
            ProductDraft::default().validate(),
            Err(ProductDraftError::MissingName)
        );
    }

    #[test]
    fn test_product_input_json() {
        let body = draft("10", "", "").validate().unwrap().to_json();
        assert_eq!(body["pname"], "Handloom Saree");
        assert_eq!(body["stock"], 0);
        assert!(body.get("mrp").is_none());
    }

    #[test]
    fn test_list_query_pairs_skip_blanks() {
        let query = ListQuery {
            page: Some(0),
            search: Some("  ".to_owned()),
            category: Some("decor".to_owned()),
            ..ListQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![("page", "1".to_owned()), ("category", "decor".to_owned())]
        );
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOi.secret");
    }
}
