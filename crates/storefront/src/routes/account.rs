//! Account route handlers: profile and order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use bazaar_core::{OrderId, PaymentMethod, PaymentStatus};
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, ListQuery, Order};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::{ListParams, PageContext, Pager, rows_or_notice};
use crate::services::CheckoutOrchestrator;
use crate::state::AppState;

/// Orders per history page.
const PAGE_SIZE: u32 = 10;

/// Orders shown on the account overview.
const RECENT_ORDERS: u32 = 5;

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub ctx: PageContext,
    pub recent_orders: Vec<Order>,
    pub error: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub ctx: PageContext,
    pub order: Order,
    /// A widget payment for this order is still open in this session.
    pub can_pay: bool,
}

/// Display the account overview.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let query = ListQuery {
        page: Some(1),
        limit: Some(RECENT_ORDERS),
        ..ListQuery::default()
    };
    let (page, error) = rows_or_notice(state.backend().get_my_orders(&user.token, &query).await)?;

    Ok(AccountIndexTemplate {
        ctx,
        recent_orders: page.items,
        error,
    })
}

/// Display the order history.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let result = state
        .backend()
        .get_my_orders(&user.token, &params.to_query(PAGE_SIZE))
        .await;
    let (page, error) = rows_or_notice(result)?;

    Ok(OrdersTemplate {
        ctx,
        pager: Pager::new(&page, &params, "/account/orders"),
        orders: page.items,
        error,
    })
}

/// Display one order.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id, order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state
        .backend()
        .get_order(&user.token, &id)
        .await
        .map_err(|e| match e {
            BackendError::NotFound(_) => AppError::NotFound(format!("order {id}")),
            other => AppError::Backend(other),
        })?;

    let awaiting_payment = order.payment_method == PaymentMethod::Online
        && matches!(order.payment_status, PaymentStatus::Pending | PaymentStatus::Failed)
        && !order.status.is_terminal();
    let can_pay = awaiting_payment
        && CheckoutOrchestrator::new(state.backend(), &session, &user, &state.config().pricing)
            .pending_payment(&id)
            .await
            .is_some();

    Ok(OrderTemplate {
        ctx,
        order,
        can_pay,
    })
}
