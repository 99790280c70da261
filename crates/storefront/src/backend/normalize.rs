//! Normalization of backend records into the storefront's canonical types.
//!
//! Field names drift between endpoints (`pname` vs `name`, `imageUrl` vs
//! `image` vs `images[0]`, populated vs bare product references). Each
//! record type has an ordered list of JSON pointers per field; the first
//! usable value wins.

use bazaar_core::{
    AccountStatus, ApprovalStatus, CartItemId, CurrencyCode, OrderId, OrderStatus, PaymentMethod,
    PaymentStatus, Price, ProductId, Role, SellerId, ShippingAddress, UserId,
};
use rust_decimal::Decimal;
use serde_json::Value;

use super::extract;
use super::types::{
    AccountProfile, AdminStats, CartItem, Order, OrderLine, Page, PaymentIntent, Product,
    SellerRecord, SellerStats, SiteSetting, UserRecord, WishlistItem,
};

/// Image served when a record carries no usable image.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

const ID: [&str; 3] = ["/_id", "/id", "/uuid"];
const PRODUCT_REF_ID: [&str; 6] = [
    "/productId/_id",
    "/productId",
    "/product/_id",
    "/product/id",
    "/product",
    "/product_id",
];
const NAME: [&str; 8] = [
    "/pname",
    "/name",
    "/productName",
    "/title",
    "/product/pname",
    "/product/name",
    "/productId/pname",
    "/productId/name",
];
const PRICE: [&str; 8] = [
    "/price",
    "/sellingPrice",
    "/salePrice",
    "/discountPrice",
    "/product/price",
    "/product/sellingPrice",
    "/productId/price",
    "/productId/sellingPrice",
];
const MRP: [&str; 5] = ["/mrp", "/originalPrice", "/compareAtPrice", "/product/mrp", "/productId/mrp"];
const QUANTITY: [&str; 3] = ["/quantity", "/qty", "/count"];
const STOCK: [&str; 6] = [
    "/stock",
    "/countInStock",
    "/quantityAvailable",
    "/inventory",
    "/product/stock",
    "/productId/stock",
];
const AVAILABLE: [&str; 4] = ["/available", "/inStock", "/isAvailable", "/product/inStock"];
const DESCRIPTION: [&str; 4] = ["/description", "/desc", "/details", "/product/description"];
const CATEGORY: [&str; 4] = ["/category/name", "/category", "/categoryName", "/product/category"];
const SELLER_NAME: [&str; 5] = [
    "/seller/shopName",
    "/seller/name",
    "/sellerName",
    "/shopName",
    "/seller",
];
const IMAGE: [&str; 16] = [
    "/imageUrl",
    "/image",
    "/images/0",
    "/thumbnail",
    "/img",
    "/photo",
    "/product/imageUrl",
    "/product/image",
    "/product/images/0",
    "/product/thumbnail",
    "/productId/imageUrl",
    "/productId/image",
    "/productId/images/0",
    "/productImage",
    "/picture",
    "/coverImage",
];
const APPROVAL: [&str; 5] = ["/approvalStatus", "/status", "/isApproved", "/approved", "/verified"];

/// Resolves the backend's image references into URLs a browser can load.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    asset_base: String,
}

impl ImageResolver {
    /// Create a resolver that prefixes relative paths with `asset_base`
    /// (e.g. `http://localhost:5000`).
    #[must_use]
    pub fn new(asset_base: &str) -> Self {
        Self {
            asset_base: asset_base.trim_end_matches('/').to_owned(),
        }
    }

    /// Resolve one raw image reference.
    ///
    /// - absolute `http(s)://` and `data:` URLs pass through;
    /// - protocol-relative `//cdn/...` URLs get `https:`;
    /// - Windows-style separators become `/`;
    /// - a bare file name is assumed to live under `/uploads/`;
    /// - any other relative path is joined onto the asset base;
    /// - blank input yields [`PLACEHOLDER_IMAGE`].
    #[must_use]
    pub fn resolve(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw == "null" || raw == "undefined" {
            return PLACEHOLDER_IMAGE.to_owned();
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            return raw.to_owned();
        }
        if raw.starts_with("//") {
            return format!("https:{raw}");
        }

        let path = raw.replace('\\', "/");
        let path = path.trim_start_matches("./").trim_start_matches('/');
        if path.contains('/') {
            format!("{}/{path}", self.asset_base)
        } else {
            format!("{}/uploads/{path}", self.asset_base)
        }
    }

    /// Resolve the first usable image of a record.
    ///
    /// Image slots may hold a string or an object with `url`,
    /// `secure_url` or `src`.
    #[must_use]
    pub fn first_image(&self, record: &Value) -> String {
        IMAGE
            .iter()
            .filter_map(|path| record.pointer(path))
            .find_map(image_reference)
            .map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), |raw| self.resolve(raw))
    }

    /// Resolve every image of a record, primary image first, without duplicates.
    #[must_use]
    pub fn all_images(&self, record: &Value) -> Vec<String> {
        let mut images = vec![self.first_image(record)];
        if let Some(Value::Array(list)) = record.pointer("/images") {
            for url in list.iter().filter_map(image_reference).map(|raw| self.resolve(raw)) {
                if !images.contains(&url) {
                    images.push(url);
                }
            }
        }
        if images.len() > 1 {
            images.retain(|url| url != PLACEHOLDER_IMAGE);
        }
        images
    }
}

fn image_reference(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
        Value::Object(_) => ["/url", "/secure_url", "/src", "/path"]
            .iter()
            .find_map(|p| value.pointer(p).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty()),
        _ => None,
    }
}

fn currency(record: &Value) -> CurrencyCode {
    extract::string(record, &["/currency", "/currencyCode"])
        .and_then(|code| CurrencyCode::parse(&code))
        .unwrap_or_default()
}

fn price_at(record: &Value, paths: &[&str]) -> Option<Price> {
    extract::decimal(record, paths).map(|amount| Price::new(amount, currency(record)))
}

fn quantity_of(record: &Value) -> u32 {
    extract::count(record, &QUANTITY)
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or(1)
        .max(1)
}

fn availability(record: &Value) -> bool {
    extract::flag(record, &AVAILABLE)
        .or_else(|| extract::count(record, &STOCK).map(|stock| stock > 0))
        .unwrap_or(true)
}

/// Shorten an ISO timestamp to its date part.
fn date_of(record: &Value, paths: &[&str]) -> String {
    extract::string(record, paths)
        .map(|ts| ts.split('T').next().unwrap_or_default().to_owned())
        .unwrap_or_default()
}

/// Normalize a cart line. Returns `None` when no product reference exists.
#[must_use]
pub fn cart_item(record: &Value, images: &ImageResolver) -> Option<CartItem> {
    let product_id = extract::string(record, &PRODUCT_REF_ID)
        .or_else(|| extract::string(record, &ID))
        .map(ProductId::new)?;
    let id = extract::string(record, &ID)
        .or_else(|| extract::string(record, &["/cartItemId", "/itemId"]))
        .map_or_else(|| CartItemId::new(product_id.as_str()), CartItemId::new);

    Some(CartItem {
        id,
        name: extract::string(record, &NAME).unwrap_or_else(|| "Unnamed product".to_owned()),
        image: images.first_image(record),
        price: price_at(record, &PRICE).unwrap_or_else(|| Price::zero(currency(record))),
        quantity: quantity_of(record),
        available: availability(record),
        product_id,
    })
}

/// Normalize a wishlist entry, which may be a populated product or a
/// `{product: {...}}` wrapper.
#[must_use]
pub fn wishlist_item(record: &Value, images: &ImageResolver) -> Option<WishlistItem> {
    let product_id = extract::string(record, &PRODUCT_REF_ID)
        .or_else(|| extract::string(record, &ID))
        .map(ProductId::new)?;

    Some(WishlistItem {
        name: extract::string(record, &NAME).unwrap_or_else(|| "Unnamed product".to_owned()),
        image: images.first_image(record),
        price: price_at(record, &PRICE).unwrap_or_else(|| Price::zero(currency(record))),
        available: availability(record),
        product_id,
    })
}

/// Normalize a catalog product.
#[must_use]
pub fn product(record: &Value, images: &ImageResolver) -> Option<Product> {
    let id = extract::string(record, &ID).map(ProductId::new)?;

    Some(Product {
        id,
        name: extract::string(record, &NAME).unwrap_or_else(|| "Unnamed product".to_owned()),
        description: extract::string(record, &DESCRIPTION).unwrap_or_default(),
        price: price_at(record, &PRICE).unwrap_or_else(|| Price::zero(currency(record))),
        mrp: price_at(record, &MRP),
        image: images.first_image(record),
        images: images.all_images(record),
        category: extract::string(record, &CATEGORY),
        stock: extract::count(record, &STOCK).and_then(|s| u32::try_from(s).ok()),
        seller_name: extract::string(record, &SELLER_NAME),
        approval: approval(record),
    })
}

fn approval(record: &Value) -> ApprovalStatus {
    APPROVAL
        .iter()
        .filter_map(|path| record.pointer(path))
        .find_map(|value| match value {
            Value::Bool(true) => Some(ApprovalStatus::Approved),
            Value::Bool(false) => Some(ApprovalStatus::Pending),
            Value::String(s) => Some(ApprovalStatus::parse_lenient(s)),
            _ => None,
        })
        .unwrap_or(ApprovalStatus::Approved)
}

/// Normalize a paginated list of records with `item` as the per-record mapper.
///
/// Pagination metadata is probed on the payload; when absent, the page is
/// treated as the only one.
pub fn page<T>(
    payload: &Value,
    resource_keys: &[&str],
    requested_page: u32,
    item: impl Fn(&Value) -> Option<T>,
) -> Page<T> {
    let items: Vec<T> = extract::list(payload, resource_keys)
        .iter()
        .filter_map(item)
        .collect();

    let page = extract::count(
        payload,
        &["/page", "/currentPage", "/pagination/page", "/meta/page"],
    )
    .and_then(|p| u32::try_from(p).ok())
    .unwrap_or(requested_page)
    .max(1);

    let total_pages = extract::count(
        payload,
        &[
            "/totalPages",
            "/pages",
            "/pagination/totalPages",
            "/pagination/pages",
            "/meta/totalPages",
        ],
    )
    .and_then(|p| u32::try_from(p).ok())
    .unwrap_or(page)
    .max(page);

    let total = extract::count(
        payload,
        &["/total", "/totalCount", "/count", "/pagination/total", "/meta/total"],
    );

    Page {
        items,
        page,
        total_pages,
        total,
    }
}

/// Normalize the account returned by login or `/auth/me`.
#[must_use]
pub fn account(record: &Value) -> Option<AccountProfile> {
    let user = extract::object(record, &["/user", "/data/user", "/profile"]).unwrap_or(record);
    let id = extract::string(user, &ID).map(UserId::new)?;

    Some(AccountProfile {
        id,
        name: extract::string(user, &["/name", "/fullName", "/username", "/firstName"])
            .unwrap_or_default(),
        email: extract::string(user, &["/email"]).unwrap_or_default(),
        role: extract::string(user, &["/role", "/userType", "/type"])
            .or_else(|| extract::string(record, &["/role"]))
            .map(|r| Role::parse_lenient(&r))
            .unwrap_or_default(),
    })
}

/// Extract the bearer token from a login response.
#[must_use]
pub fn token(record: &Value) -> Option<String> {
    extract::string(
        record,
        &["/token", "/accessToken", "/access_token", "/jwt", "/data/token", "/user/token"],
    )
}

fn order_line(record: &Value, images: &ImageResolver) -> OrderLine {
    OrderLine {
        product_id: extract::string(record, &PRODUCT_REF_ID).map(ProductId::new),
        name: extract::string(record, &NAME).unwrap_or_else(|| "Item".to_owned()),
        image: images.first_image(record),
        price: price_at(record, &PRICE).unwrap_or_else(|| Price::zero(currency(record))),
        quantity: quantity_of(record),
    }
}

fn shipping_address(record: &Value) -> Option<ShippingAddress> {
    let address = extract::object(record, &["/shippingAddress", "/address", "/shipping"])?;
    let field = |paths: &[&str]| extract::string(address, paths).unwrap_or_default();

    Some(ShippingAddress {
        full_name: field(&["/fullName", "/name"]),
        phone: field(&["/phone", "/mobile"]),
        line1: field(&["/line1", "/addressLine1", "/street", "/address"]),
        line2: field(&["/line2", "/addressLine2", "/landmark"]),
        city: field(&["/city"]),
        state: field(&["/state"]),
        postal_code: field(&["/postalCode", "/pincode", "/zip"]),
        country: field(&["/country"]),
    })
}

/// Normalize an order record.
#[must_use]
pub fn order(record: &Value, images: &ImageResolver) -> Option<Order> {
    let record = extract::object(record, &["/order"]).unwrap_or(record);
    let id = extract::string(record, &["/_id", "/id", "/orderId"]).map(OrderId::new)?;

    let items = record
        .pointer("/items")
        .or_else(|| record.pointer("/orderItems"))
        .or_else(|| record.pointer("/products"))
        .unwrap_or(&Value::Null);
    let lines: Vec<OrderLine> = extract::list(items, &[])
        .iter()
        .map(|line| order_line(line, images))
        .collect();

    let total = price_at(record, &["/totalAmount", "/total", "/totalPrice", "/amount"])
        .unwrap_or_else(|| lines.iter().map(OrderLine::line_total).sum());

    Some(Order {
        id,
        status: extract::string(record, &["/orderStatus", "/status"])
            .map(|s| OrderStatus::parse_lenient(&s))
            .unwrap_or_default(),
        payment_status: extract::string(record, &["/paymentStatus", "/payment/status"])
            .map(|s| PaymentStatus::parse_lenient(&s))
            .or_else(|| {
                extract::flag(record, &["/isPaid"]).map(|paid| {
                    if paid { PaymentStatus::Paid } else { PaymentStatus::Pending }
                })
            })
            .unwrap_or_default(),
        payment_method: extract::string(record, &["/paymentMethod", "/payment/method"])
            .map(|s| PaymentMethod::parse_lenient(&s))
            .unwrap_or_default(),
        total,
        placed_on: date_of(record, &["/createdAt", "/created_at", "/orderDate"]),
        customer_name: extract::string(
            record,
            &["/user/name", "/customer/name", "/customerName", "/shippingAddress/fullName"],
        ),
        lines,
        address: shipping_address(record),
    })
}

/// Normalize a user row for the admin console.
#[must_use]
pub fn user_record(record: &Value) -> Option<UserRecord> {
    let id = extract::string(record, &ID).map(UserId::new)?;
    let status = extract::flag(record, &["/isBlocked", "/blocked"])
        .map(|blocked| if blocked { AccountStatus::Blocked } else { AccountStatus::Active })
        .or_else(|| {
            extract::string(record, &["/status", "/accountStatus"])
                .map(|s| AccountStatus::parse_lenient(&s))
        })
        .unwrap_or_default();

    Some(UserRecord {
        id,
        name: extract::string(record, &["/name", "/fullName", "/username"]).unwrap_or_default(),
        email: extract::string(record, &["/email"]).unwrap_or_default(),
        role: extract::string(record, &["/role"])
            .map(|r| Role::parse_lenient(&r))
            .unwrap_or_default(),
        status,
        joined_on: date_of(record, &["/createdAt", "/created_at"]),
    })
}

/// Normalize a seller row for the admin console.
#[must_use]
pub fn seller_record(record: &Value) -> Option<SellerRecord> {
    let id = extract::string(record, &["/_id", "/id", "/sellerId", "/user/_id"]).map(SellerId::new)?;

    Some(SellerRecord {
        id,
        name: extract::string(record, &["/name", "/user/name", "/ownerName"]).unwrap_or_default(),
        email: extract::string(record, &["/email", "/user/email"]).unwrap_or_default(),
        shop_name: extract::string(record, &["/shopName", "/storeName", "/businessName", "/name"])
            .unwrap_or_default(),
        approval: approval(record),
        product_count: extract::count(record, &["/productCount", "/productsCount", "/totalProducts"])
            .and_then(|c| u32::try_from(c).ok()),
    })
}

fn revenue(record: &Value) -> Price {
    Price::new(
        extract::decimal(record, &["/revenue", "/totalRevenue", "/totalSales", "/earnings"])
            .unwrap_or(Decimal::ZERO),
        currency(record),
    )
}

/// Normalize seller dashboard statistics. Missing numbers read as zero.
#[must_use]
pub fn seller_stats(record: &Value) -> SellerStats {
    let stats = extract::object(record, &["/stats", "/dashboard"]).unwrap_or(record);
    SellerStats {
        products: extract::count(stats, &["/products", "/totalProducts", "/productCount"])
            .unwrap_or(0),
        orders: extract::count(stats, &["/orders", "/totalOrders", "/orderCount"]).unwrap_or(0),
        pending_orders: extract::count(stats, &["/pendingOrders", "/pending"]).unwrap_or(0),
        revenue: revenue(stats),
    }
}

/// Normalize admin dashboard analytics. Missing numbers read as zero.
#[must_use]
pub fn admin_stats(record: &Value, images: &ImageResolver) -> AdminStats {
    let stats = extract::object(record, &["/stats", "/analytics", "/dashboard"]).unwrap_or(record);
    let recent_orders = record
        .pointer("/recentOrders")
        .or_else(|| stats.pointer("/recentOrders"))
        .map(|orders| {
            extract::list(orders, &[])
                .iter()
                .filter_map(|o| order(o, images))
                .collect()
        })
        .unwrap_or_default();

    AdminStats {
        users: extract::count(stats, &["/users", "/totalUsers", "/userCount"]).unwrap_or(0),
        sellers: extract::count(stats, &["/sellers", "/totalSellers", "/sellerCount"]).unwrap_or(0),
        products: extract::count(stats, &["/products", "/totalProducts", "/productCount"])
            .unwrap_or(0),
        orders: extract::count(stats, &["/orders", "/totalOrders", "/orderCount"]).unwrap_or(0),
        revenue: revenue(stats),
        recent_orders,
    }
}

/// Normalize site settings, which arrive either as a flat object or as a list
/// of `{key, value}` pairs.
#[must_use]
pub fn settings(payload: &Value) -> Vec<SiteSetting> {
    let payload = extract::object(payload, &["/settings"]).unwrap_or(payload);

    if let Value::Object(map) = payload {
        let looks_like_pairs = map.contains_key("key") && map.contains_key("value");
        if !looks_like_pairs && !map.values().any(Value::is_array) {
            return map
                .iter()
                .filter(|(key, _)| !matches!(key.as_str(), "_id" | "id" | "__v" | "createdAt" | "updatedAt"))
                .map(|(key, value)| SiteSetting {
                    key: key.clone(),
                    value: match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    },
                })
                .collect();
        }
    }

    extract::list(payload, &["settings"])
        .iter()
        .filter_map(|entry| {
            Some(SiteSetting {
                key: extract::string(entry, &["/key", "/name"])?,
                value: extract::string(entry, &["/value"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// Normalize a payment-intent response.
///
/// `fallback_key` is used when the backend does not echo the publishable key;
/// `fallback_amount` when it does not echo the amount.
#[must_use]
pub fn payment_intent(
    payload: &Value,
    fallback_key: Option<&str>,
    fallback_amount: i64,
) -> Option<PaymentIntent> {
    let intent = extract::object(payload, &["/razorpayOrder", "/order", "/payment"]).unwrap_or(payload);

    let gateway_order_id = extract::string(
        intent,
        &["/razorpayOrderId", "/razorpay_order_id", "/id", "/orderId"],
    )
    .or_else(|| extract::string(payload, &["/razorpayOrderId", "/razorpay_order_id"]))?;

    let key_id = extract::string(payload, &["/key", "/keyId", "/key_id", "/razorpayKey"])
        .or_else(|| fallback_key.map(str::to_owned))?;

    Some(PaymentIntent {
        gateway_order_id,
        amount_minor: extract::count(intent, &["/amount", "/amount_due"])
            .and_then(|a| i64::try_from(a).ok())
            .unwrap_or(fallback_amount),
        currency: extract::string(intent, &["/currency"]).unwrap_or_else(|| "INR".to_owned()),
        key_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver() -> ImageResolver {
        ImageResolver::new("http://api.local:5000/")
    }

    #[test]
    fn test_resolve_image_variants() {
        let r = resolver();
        assert_eq!(r.resolve("https://cdn.x/a.jpg"), "https://cdn.x/a.jpg");
        assert_eq!(r.resolve("//cdn.x/a.jpg"), "https://cdn.x/a.jpg");
        assert_eq!(r.resolve("uploads\\products\\a.jpg"), "http://api.local:5000/uploads/products/a.jpg");
        assert_eq!(r.resolve("/uploads/a.jpg"), "http://api.local:5000/uploads/a.jpg");
        assert_eq!(r.resolve("a.jpg"), "http://api.local:5000/uploads/a.jpg");
        assert_eq!(r.resolve("  "), PLACEHOLDER_IMAGE);
        assert_eq!(r.resolve("undefined"), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_first_image_handles_object_slots() {
        let record = json!({"images": [{"secure_url": "https://img.host/p.png"}]});
        assert_eq!(resolver().first_image(&record), "https://img.host/p.png");
        assert_eq!(resolver().first_image(&json!({})), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_all_images_dedupes() {
        let record = json!({"imageUrl": "a.jpg", "images": ["a.jpg", "b.jpg"]});
        assert_eq!(
            resolver().all_images(&record),
            vec![
                "http://api.local:5000/uploads/a.jpg".to_owned(),
                "http://api.local:5000/uploads/b.jpg".to_owned()
            ]
        );
    }

    #[test]
    fn test_cart_item_with_populated_product() {
        let record = json!({
            "_id": "line1",
            "productId": {"_id": "p1", "pname": "Teak Stool", "price": "1499", "stock": 0},
            "quantity": 0
        });
        let item = cart_item(&record, &resolver()).unwrap();
        assert_eq!(item.id.as_str(), "line1");
        assert_eq!(item.product_id.as_str(), "p1");
        assert_eq!(item.name, "Teak Stool");
        assert_eq!(item.price.amount, Decimal::from(1499));
        assert_eq!(item.quantity, 1);
        assert!(!item.available);
    }

    #[test]
    fn test_cart_item_with_flat_fields() {
        let record = json!({"product": "p2", "name": "Jute Bag", "price": 250.5, "qty": 3, "image": "bag.png"});
        let item = cart_item(&record, &resolver()).unwrap();
        assert_eq!(item.id.as_str(), "p2");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.image, "http://api.local:5000/uploads/bag.png");
        assert!(item.available);
        assert_eq!(item.line_total().amount, Decimal::new(7515, 1));
    }

    #[test]
    fn test_cart_item_without_reference_is_dropped() {
        assert!(cart_item(&json!({"name": "ghost"}), &resolver()).is_none());
    }

    #[test]
    fn test_wishlist_item_from_wrapper() {
        let record = json!({"product": {"_id": "p3", "name": "Brass Lamp", "price": 899, "inStock": false}});
        let item = wishlist_item(&record, &resolver()).unwrap();
        assert_eq!(item.product_id.as_str(), "p3");
        assert_eq!(item.name, "Brass Lamp");
        assert!(!item.available);
    }

    #[test]
    fn test_product_discount_and_approval() {
        let record = json!({"id": 12, "title": "Kurta", "price": 750, "mrp": 1000, "isApproved": false});
        let product = product(&record, &resolver()).unwrap();
        assert_eq!(product.id.as_str(), "12");
        assert_eq!(product.discount_percent(), Some(25));
        assert_eq!(product.approval, ApprovalStatus::Pending);
        assert!(product.in_stock());
    }

    #[test]
    fn test_page_metadata() {
        let payload = json!({"products": [{"_id": "a"}, {"_id": "b"}], "pagination": {"page": 2, "totalPages": 5, "total": 48}});
        let page = page(&payload, &["products"], 1, |r| product(r, &resolver()));
        assert_eq!(page.items.len(), 2);
        assert_eq!((page.page, page.total_pages, page.total), (2, 5, Some(48)));
        assert!(page.has_next());
    }

    #[test]
    fn test_page_without_metadata_is_single() {
        let page = page(&json!([{"_id": "a"}]), &[], 3, |r| product(r, &resolver()));
        assert_eq!((page.page, page.total_pages), (3, 3));
        assert!(!page.has_next());
    }

    #[test]
    fn test_account_and_token() {
        let payload = json!({"token": "jwt.abc", "user": {"_id": "u1", "name": "Asha", "email": "a@b.in", "role": "vendor"}});
        assert_eq!(token(&payload).as_deref(), Some("jwt.abc"));
        let profile = account(&payload).unwrap();
        assert_eq!(profile.role, Role::Seller);
        assert_eq!(profile.name, "Asha");
    }

    #[test]
    fn test_order_totals_fall_back_to_lines() {
        let record = json!({
            "_id": "o1",
            "orderStatus": "Shipped",
            "isPaid": true,
            "createdAt": "2026-03-01T10:00:00Z",
            "items": [{"name": "A", "price": 100, "quantity": 2}, {"name": "B", "price": 50}]
        });
        let order = order(&record, &resolver()).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total.amount, Decimal::from(250));
        assert_eq!(order.placed_on, "2026-03-01");
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_user_record_blocked_flag() {
        let user = user_record(&json!({"_id": "u2", "name": "Dev", "isBlocked": true})).unwrap();
        assert_eq!(user.status, AccountStatus::Blocked);
    }

    #[test]
    fn test_settings_shapes() {
        let flat = settings(&json!({"_id": "s", "siteName": "Bazaar", "codEnabled": true}));
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].value, "true");

        let pairs = settings(&json!([{"key": "siteName", "value": "Bazaar"}]));
        assert_eq!(pairs[0].key, "siteName");
    }

    #[test]
    fn test_payment_intent_shapes() {
        let nested = json!({"razorpayOrder": {"id": "order_9", "amount": 40300, "currency": "INR"}, "key": "rzp_test"});
        let intent = payment_intent(&nested, None, 0).unwrap();
        assert_eq!(intent.gateway_order_id, "order_9");
        assert_eq!(intent.amount_minor, 40300);
        assert_eq!(intent.key_id, "rzp_test");

        let flat = json!({"razorpay_order_id": "order_7"});
        let intent = payment_intent(&flat, Some("rzp_cfg"), 999).unwrap();
        assert_eq!((intent.amount_minor, intent.key_id.as_str()), (999, "rzp_cfg"));

        assert!(payment_intent(&json!({"ok": true}), Some("k"), 1).is_none());
    }
}
