//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products)
//! GET  /health, /health/ready  - Liveness / readiness
//!
//! # Catalog
//! GET  /products               - Listing (q, category, sort, page)
//! GET  /products/{id}          - Product detail
//!
//! # Cart & wishlist (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/add | /cart/update | /cart/remove | /cart/clear
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/add | /wishlist/remove | /wishlist/toggle | /wishlist/move-to-cart
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Redirect to the current step
//! GET|POST /checkout/shipping | /checkout/payment
//! GET  /checkout/review
//! POST /checkout/place
//! GET  /checkout/pay/{order_id}    - Razorpay widget
//! POST /checkout/payment/verify | /checkout/payment/cancel
//! GET  /checkout/success/{order_id}
//!
//! # Auth
//! GET|POST /auth/login | /auth/register
//! POST /auth/logout
//!
//! # Account (requires auth)
//! GET  /account, /account/orders, /account/orders/{id}
//!
//! # Seller dashboard (seller role)
//! GET  /seller, /seller/products, /seller/products/new, /seller/products/{id}/edit
//! POST /seller/products, /seller/products/{id}, /seller/products/{id}/delete
//! GET  /seller/orders, POST /seller/orders/{id}/status
//!
//! # Admin console (admin role)
//! GET  /admin, /admin/users, /admin/sellers, /admin/products, /admin/orders, /admin/settings
//! POST /admin/users/{id}/status, /admin/users/{id}/delete
//! POST /admin/sellers/{id}/approval
//! POST /admin/products/{id}/status, /admin/products/{id}/delete
//! POST /admin/orders/{id}/status, /admin/settings
//!
//! # API
//! GET  /api/search             - JSON suggestions for the search box
//! ```

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod context;
pub mod health;
pub mod home;
pub mod products;
pub mod seller;
pub mod wishlist;

pub use context::PageContext;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::backend::{BackendError, ListQuery, Page};
use crate::error::{AppError, Result};
use crate::middleware::{auth_rate_limiter, checkout_rate_limiter, safe_next};
use crate::models::flash::{self, Flash};
use crate::state::AppState;

// =============================================================================
// Shared Helpers
// =============================================================================

/// Listing query string shared by every paginated page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub status: String,
}

impl ListParams {
    /// Backend query with the given page size.
    #[must_use]
    pub fn to_query(&self, limit: u32) -> ListQuery {
        let non_blank = |s: &str| Some(s.trim().to_owned()).filter(|s| !s.is_empty());
        ListQuery {
            page: Some(self.page.unwrap_or(1).max(1)),
            limit: Some(limit),
            search: non_blank(&self.q),
            category: non_blank(&self.category),
            sort: non_blank(&self.sort),
            status: non_blank(&self.status),
        }
    }

    /// Whether `value` is the selected sort order.
    #[must_use]
    pub fn is_sort(&self, value: &str) -> bool {
        self.sort == value
    }

    /// Same filters, another page, as an href.
    fn href(&self, path: &str, page: u32) -> String {
        let mut pairs = vec![format!("page={page}")];
        for (key, value) in [
            ("q", &self.q),
            ("category", &self.category),
            ("sort", &self.sort),
            ("status", &self.status),
        ] {
            if !value.trim().is_empty() {
                pairs.push(format!("{key}={}", urlencoding::encode(value.trim())));
            }
        }
        format!("{path}?{}", pairs.join("&"))
    }
}

/// Previous/next links for a paginated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub total_pages: u32,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

impl Pager {
    #[must_use]
    pub fn new<T>(page: &Page<T>, params: &ListParams, path: &str) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages.max(1),
            prev_href: (page.page > 1).then(|| params.href(path, page.page - 1)),
            next_href: page.has_next().then(|| params.href(path, page.page + 1)),
        }
    }

    /// Whether there is more than one page to navigate.
    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.prev_href.is_some() || self.next_href.is_some()
    }
}

/// Flash the outcome of a form post and redirect.
///
/// A rejected token is returned as an error instead, so the forced-logout
/// layer can end the session.
pub(crate) async fn finish<T, E>(
    session: &Session,
    result: std::result::Result<T, E>,
    success: &str,
    to: &str,
) -> Result<Redirect>
where
    E: Into<AppError>,
{
    match result.map_err(Into::into) {
        Ok(_) => flash::push(session, Flash::success(success)).await,
        Err(e) if e.is_auth_failure() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Action failed");
            flash::push(session, Flash::error(e.user_message())).await;
        }
    }
    Ok(Redirect::to(to))
}

/// Split a listing result into rows and a notice.
///
/// Token rejections stay errors; anything else renders an empty table with
/// the failure explained.
pub(crate) fn rows_or_notice<T>(
    result: std::result::Result<Page<T>, BackendError>,
) -> Result<(Page<T>, Option<String>)> {
    match result {
        Ok(page) => Ok((page, None)),
        Err(e) if e.is_auth_failure() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load listing");
            Ok((Page::single(Vec::new()), Some(e.user_message())))
        }
    }
}

/// Error text as a sentence for display.
pub(crate) fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Where a form wants to go back to, if it named a local path.
pub(crate) fn back_to<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    safe_next(next).unwrap_or(fallback)
}

// =============================================================================
// Routers
// =============================================================================

/// Catalog routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Wishlist routes.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/toggle", post(wishlist::toggle))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Checkout wizard and payment routes.
pub fn checkout_routes() -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/place", post(checkout::place))
        .route("/payment/verify", post(checkout::verify_payment))
        .route("/payment/cancel", post(checkout::cancel_payment))
        .layer(checkout_rate_limiter());

    Router::new()
        .route("/", get(checkout::index))
        .route(
            "/shipping",
            get(checkout::shipping_page).post(checkout::save_shipping),
        )
        .route(
            "/payment",
            get(checkout::payment_page).post(checkout::save_payment),
        )
        .route("/review", get(checkout::review))
        .route("/pay/{order_id}", get(checkout::pay))
        .route("/success/{order_id}", get(checkout::success))
        .merge(rate_limited)
}

/// Login, registration and logout.
pub fn auth_routes() -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(rate_limited)
}

/// Consumer account routes.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
}

/// Seller dashboard routes.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(seller::dashboard))
        .route(
            "/products",
            get(seller::products).post(seller::create_product),
        )
        .route("/products/new", get(seller::new_product))
        .route("/products/{id}", post(seller::update_product))
        .route("/products/{id}/edit", get(seller::edit_product))
        .route("/products/{id}/delete", post(seller::delete_product))
        .route("/orders", get(seller::orders))
        .route("/orders/{id}/status", post(seller::update_order_status))
}

/// Admin console routes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/users/{id}/status", post(admin::set_user_status))
        .route("/users/{id}/delete", post(admin::delete_user))
        .route("/sellers", get(admin::sellers))
        .route("/sellers/{id}/approval", post(admin::set_seller_approval))
        .route("/products", get(admin::products))
        .route("/products/{id}/status", post(admin::set_product_approval))
        .route("/products/{id}/delete", post(admin::delete_product))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", post(admin::set_order_status))
        .route(
            "/settings",
            get(admin::settings).post(admin::update_settings),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/seller", seller_routes())
        .nest("/admin", admin_routes())
        .route("/api/search", get(api::search))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, total_pages: u32) -> Page<()> {
        Page {
            items: Vec::new(),
            page,
            total_pages,
            total: None,
        }
    }

    #[test]
    fn test_list_params_to_query() {
        let params = ListParams {
            page: Some(0),
            q: "  lamp ".to_owned(),
            ..ListParams::default()
        };
        let query = params.to_query(12);
        assert_eq!(query.page, Some(1));
        assert_eq!(query.limit, Some(12));
        assert_eq!(query.search.as_deref(), Some("lamp"));
        assert_eq!(query.category, None);
    }

    #[test]
    fn test_pager_links_keep_filters() {
        let params = ListParams {
            q: "brass lamp".to_owned(),
            category: "decor".to_owned(),
            ..ListParams::default()
        };
        let pager = Pager::new(&page(2, 3), &params, "/products");
        assert_eq!(
            pager.prev_href.as_deref(),
            Some("/products?page=1&q=brass%20lamp&category=decor")
        );
        assert_eq!(
            pager.next_href.as_deref(),
            Some("/products?page=3&q=brass%20lamp&category=decor")
        );
        assert!(pager.is_needed());
    }

    #[test]
    fn test_single_page_needs_no_pager() {
        let pager = Pager::new(&page(1, 1), &ListParams::default(), "/admin/users");
        assert!(!pager.is_needed());
    }

    #[test]
    fn test_back_to_rejects_offsite() {
        assert_eq!(back_to(Some("/wishlist"), "/cart"), "/wishlist");
        assert_eq!(back_to(Some("https://evil.example"), "/cart"), "/cart");
        assert_eq!(back_to(None, "/cart"), "/cart");
    }

    #[test]
    fn test_sentence_capitalizes_first_letter() {
        assert_eq!(sentence("your cart is empty"), "Your cart is empty");
        assert_eq!(sentence(""), "");
    }
}
