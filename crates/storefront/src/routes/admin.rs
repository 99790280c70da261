//! Admin console route handlers.
//!
//! Every handler requires the admin role. Tables are paginated by the
//! backend; actions are form posts that flash their outcome and return to
//! the table they came from.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use bazaar_core::{
    AccountStatus, ApprovalStatus, OrderId, OrderStatus, ProductId, SellerId, UserId,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{AdminStats, Order, Product, SellerRecord, SiteSetting, UserRecord};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::flash::{self, Flash};
use crate::routes::{ListParams, PageContext, Pager, back_to, finish, rows_or_notice};
use crate::state::AppState;

/// Rows per admin table page.
const PAGE_SIZE: u32 = 20;

/// Form field prefix for settings, e.g. `setting.store_tagline`.
const SETTING_PREFIX: &str = "setting.";

// =============================================================================
// Form Types
// =============================================================================

/// Status change form data. Also carries the page to return to.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    pub next: Option<String>,
}

/// Delete confirmation form data.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin overview template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: Option<AdminStats>,
    pub error: Option<String>,
}

/// Users table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub ctx: PageContext,
    pub users: Vec<UserRecord>,
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Sellers table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/sellers.html")]
pub struct SellersTemplate {
    pub ctx: PageContext,
    pub sellers: Vec<SellerRecord>,
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Products moderation table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Orders table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub statuses: &'static [OrderStatus],
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Site settings template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/settings.html")]
pub struct SettingsTemplate {
    pub ctx: PageContext,
    pub settings: Vec<SiteSetting>,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Settings posted as `setting.<key>=<value>` pairs.
fn settings_from_form(pairs: Vec<(String, String)>) -> Vec<SiteSetting> {
    pairs
        .into_iter()
        .filter_map(|(name, value)| {
            let key = name.strip_prefix(SETTING_PREFIX)?.trim();
            (!key.is_empty()).then(|| SiteSetting {
                key: key.to_owned(),
                value: value.trim().to_owned(),
            })
        })
        .collect()
}

// =============================================================================
// Overview
// =============================================================================

/// Display the admin overview.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (stats, error) = match state.backend().get_admin_stats(&user.token).await {
        Ok(stats) => (Some(stats), None),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load admin stats");
            (None, Some(e.user_message()))
        }
    };

    Ok(DashboardTemplate { ctx, stats, error })
}

// =============================================================================
// Users
// =============================================================================

/// Display the users table.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_admin_users(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(UsersTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/admin/users"),
        users: page.items,
        params,
        error,
    })
}

/// Block or unblock an account. Admins cannot block themselves.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, target = %id))]
pub async fn set_user_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<UserId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let to = back_to(form.next.as_deref(), "/admin/users");
    if id == user.user.id {
        flash::push(&session, Flash::error("You cannot change your own account status.")).await;
        return Ok(Redirect::to(to));
    }

    let status = AccountStatus::parse_lenient(&form.status);
    let result = state.backend().set_user_status(&user.token, &id, status).await;
    let message = match status {
        AccountStatus::Active => "User unblocked",
        AccountStatus::Blocked => "User blocked",
    };
    finish(&session, result, message, to).await
}

/// Delete an account. Admins cannot delete themselves.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, target = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<UserId>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect> {
    let to = back_to(form.next.as_deref(), "/admin/users");
    if id == user.user.id {
        flash::push(&session, Flash::error("You cannot delete your own account.")).await;
        return Ok(Redirect::to(to));
    }

    let result = state.backend().delete_user(&user.token, &id).await;
    finish(&session, result, "User deleted", to).await
}

// =============================================================================
// Sellers
// =============================================================================

/// Display the sellers table.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn sellers(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_admin_sellers(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(SellersTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/admin/sellers"),
        sellers: page.items,
        params,
        error,
    })
}

/// Approve or reject a seller.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, seller_id = %id))]
pub async fn set_seller_approval(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<SellerId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let approval = ApprovalStatus::parse_lenient(&form.status);
    let result = state
        .backend()
        .set_seller_approval(&user.token, &id, approval)
        .await;
    finish(
        &session,
        result,
        &format!("Seller marked {}", approval.as_str()),
        back_to(form.next.as_deref(), "/admin/sellers"),
    )
    .await
}

// =============================================================================
// Products
// =============================================================================

/// Display the product moderation table.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_admin_products(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(ProductsTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/admin/products"),
        products: page.items,
        params,
        error,
    })
}

/// Approve or reject a product listing.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, product_id = %id))]
pub async fn set_product_approval(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let approval = ApprovalStatus::parse_lenient(&form.status);
    let result = state
        .backend()
        .set_product_approval(&user.token, &id, approval)
        .await;
    finish(
        &session,
        result,
        &format!("Product marked {}", approval.as_str()),
        back_to(form.next.as_deref(), "/admin/products"),
    )
    .await
}

/// Remove a product listing.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect> {
    let result = state.backend().delete_product(&user.token, &id).await;
    finish(
        &session,
        result,
        "Product deleted",
        back_to(form.next.as_deref(), "/admin/products"),
    )
    .await
}

// =============================================================================
// Orders
// =============================================================================

/// Display every order.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_admin_orders(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(OrdersTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/admin/orders"),
        orders: page.items,
        statuses: &OrderStatus::ALL,
        params,
        error,
    })
}

/// Override an order's status.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, order_id = %id))]
pub async fn set_order_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status = OrderStatus::parse_lenient(&form.status);
    let result = state.backend().set_order_status(&user.token, &id, status).await;
    finish(
        &session,
        result,
        &format!("Order {id} marked {}", status.as_str()),
        back_to(form.next.as_deref(), "/admin/orders"),
    )
    .await
}

// =============================================================================
// Settings
// =============================================================================

/// Display the site settings form.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn settings(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (settings, error) = match state.backend().get_settings(&user.token).await {
        Ok(settings) => (settings, None),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load settings");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(SettingsTemplate {
        ctx,
        settings,
        error,
    })
}

/// Save the site settings.
#[instrument(skip(state, session, user, pairs), fields(user_id = %user.user.id))]
pub async fn update_settings(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect> {
    let settings = settings_from_form(pairs);
    if settings.is_empty() {
        flash::push(&session, Flash::info("Nothing to save.")).await;
        return Ok(Redirect::to("/admin/settings"));
    }

    let result = state.backend().update_settings(&user.token, &settings).await;
    finish(&session, result, "Settings saved", "/admin/settings").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_form_keeps_prefixed_fields() {
        let settings = settings_from_form(vec![
            ("setting.store_tagline".to_owned(), " Handmade goods ".to_owned()),
            ("setting.".to_owned(), "ignored".to_owned()),
            ("next".to_owned(), "/admin".to_owned()),
        ]);
        assert_eq!(
            settings,
            vec![SiteSetting {
                key: "store_tagline".to_owned(),
                value: "Handmade goods".to_owned(),
            }]
        );
    }
}
