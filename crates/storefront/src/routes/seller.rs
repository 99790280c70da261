//! Seller dashboard route handlers.
//!
//! Every handler requires the seller role. Product forms are validated
//! locally before anything is sent to the backend, and a rejected form is
//! re-rendered with the seller's input intact.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{OrderId, OrderStatus, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, Order, Product, ProductDraft, SellerStats};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireSeller;
use crate::models::flash::{self, Flash};
use crate::routes::{ListParams, PageContext, Pager, finish, rows_or_notice, sentence};
use crate::state::AppState;

/// Rows per dashboard table page.
const PAGE_SIZE: u32 = 20;

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Seller overview template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: Option<SellerStats>,
    pub error: Option<String>,
}

/// Seller product table template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/products.html")]
pub struct ProductsTemplate {
    pub ctx: PageContext,
    pub products: Vec<Product>,
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Create/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub title: &'static str,
    pub action: String,
    pub draft: ProductDraft,
    pub error: Option<String>,
}

/// Seller order table template.
#[derive(Template, WebTemplate)]
#[template(path = "seller/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub statuses: &'static [OrderStatus],
    pub params: ListParams,
    pub pager: Pager,
    pub error: Option<String>,
}

fn product_form(
    ctx: PageContext,
    id: Option<&ProductId>,
    draft: ProductDraft,
    error: Option<String>,
) -> ProductFormTemplate {
    let (title, action) = id.map_or_else(
        || ("New product", "/seller/products".to_owned()),
        |id| ("Edit product", format!("/seller/products/{id}")),
    );
    ProductFormTemplate {
        ctx,
        title,
        action,
        draft,
        error,
    }
}

// =============================================================================
// Overview
// =============================================================================

/// Display the seller overview.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let (stats, error) = match state.backend().get_seller_stats(&user.token).await {
        Ok(stats) => (Some(stats), None),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load seller stats");
            (None, Some(e.user_message()))
        }
    };

    Ok(DashboardTemplate { ctx, stats, error })
}

// =============================================================================
// Products
// =============================================================================

/// Display the seller's products.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_seller_products(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(ProductsTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/seller/products"),
        products: page.items,
        params,
        error,
    })
}

/// Display an empty product form.
pub async fn new_product(RequireSeller(_user): RequireSeller, ctx: PageContext) -> impl IntoResponse {
    product_form(ctx, None, ProductDraft::default(), None)
}

/// Display the form for an existing product.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id, product_id = %id))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state
        .backend()
        .get_seller_product(&user.token, &id)
        .await
        .map_err(|e| match e {
            BackendError::NotFound(_) => AppError::NotFound(format!("product {id}")),
            other => AppError::Backend(other),
        })?;

    Ok(product_form(ctx, Some(&id), ProductDraft::from_product(&product), None))
}

/// Create a product.
#[instrument(skip(state, session, ctx, user, draft), fields(user_id = %user.user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
    Form(draft): Form<ProductDraft>,
) -> Result<Response> {
    save_product(&state, &session, &user, ctx, None, draft).await
}

/// Update a product.
#[instrument(skip(state, session, ctx, user, draft), fields(user_id = %user.user.id, product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
    Path(id): Path<ProductId>,
    Form(draft): Form<ProductDraft>,
) -> Result<Response> {
    save_product(&state, &session, &user, ctx, Some(&id), draft).await
}

async fn save_product(
    state: &AppState,
    session: &Session,
    user: &crate::models::UserSession,
    ctx: PageContext,
    id: Option<&ProductId>,
    draft: ProductDraft,
) -> Result<Response> {
    let input = match draft.validate() {
        Ok(input) => input,
        Err(e) => {
            let message = sentence(&e.to_string());
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                product_form(ctx, id, draft, Some(message)),
            )
                .into_response());
        }
    };

    let result = match id {
        Some(id) => {
            state
                .backend()
                .update_seller_product(&user.token, id, &input)
                .await
        }
        None => state.backend().create_seller_product(&user.token, &input).await,
    };

    match result {
        Ok(()) => {
            ctx.keep_flashes().await;
            let message = if id.is_some() {
                "Product updated"
            } else {
                "Product created and sent for approval"
            };
            flash::push(session, Flash::success(message)).await;
            Ok(Redirect::to("/seller/products").into_response())
        }
        Err(e) if e.is_auth_failure() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Backend rejected product");
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                product_form(ctx, id, draft, Some(e.user_message())),
            )
                .into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let result = state.backend().delete_seller_product(&user.token, &id).await;
    finish(&session, result, "Product deleted", "/seller/products").await
}

// =============================================================================
// Orders
// =============================================================================

/// Display orders containing the seller's products.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_seller_orders(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(OrdersTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/seller/orders"),
        orders: page.items,
        statuses: &OrderStatus::ALL,
        params,
        error,
    })
}

/// Move an order to a new fulfilment status.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id, order_id = %id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status = OrderStatus::parse_lenient(&form.status);
    let result = state
        .backend()
        .update_seller_order_status(&user.token, &id, status)
        .await;
    finish(
        &session,
        result,
        &format!("Order {id} marked {}", status.as_str()),
        "/seller/orders",
    )
    .await
}
