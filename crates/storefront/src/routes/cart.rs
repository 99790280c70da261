//! Cart route handlers.
//!
//! Every mutation is a plain form post that redirects back with a flash
//! message. The cart store resyncs with the backend after each change.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use bazaar_core::{CartItemId, OrderTotals, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::flash::{self, Flash};
use crate::routes::{PageContext, back_to, finish};
use crate::services::{CartSnapshot, CartStore};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    pub next: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartSnapshot,
    pub totals: OrderTotals,
    /// Names of lines that can no longer be bought.
    pub unavailable: Vec<String>,
    /// The cart could not be refreshed; showing the last snapshot.
    pub stale: bool,
}

/// Display the cart.
///
/// Falls back to the last snapshot when the backend is unreachable.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let store = CartStore::new(state.backend(), &session, &user);
    let (cart, stale) = match store.fetch().await {
        Ok(cart) => (cart, false),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh cart");
            (store.cached().await, true)
        }
    };

    ctx.cart_count = cart.count();
    let totals = OrderTotals::compute(cart.subtotal().amount, &state.config().pricing);
    Ok(CartShowTemplate {
        ctx,
        unavailable: cart.unavailable(),
        totals,
        cart,
        stale,
    })
}

/// Add a product to the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let store = CartStore::new(state.backend(), &session, &user);
    let quantity = form.quantity.unwrap_or(1).max(1);
    let result = store.add(&form.product_id, quantity).await;
    finish(
        &session,
        result,
        "Added to cart",
        back_to(form.next.as_deref(), "/cart"),
    )
    .await
}

/// Change a line's quantity. Zero removes the line.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let store = CartStore::new(state.backend(), &session, &user);
    if form.quantity == 0 {
        let result = store.remove(&form.item_id).await;
        return finish(&session, result, "Removed from cart", "/cart").await;
    }
    let result = store.update_quantity(&form.item_id, form.quantity).await;
    finish(&session, result, "Cart updated", "/cart").await
}

/// Remove a line.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let store = CartStore::new(state.backend(), &session, &user);
    let result = store.remove(&form.item_id).await;
    finish(&session, result, "Removed from cart", "/cart").await
}

/// Empty the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Redirect {
    CartStore::new(state.backend(), &session, &user).clear().await;
    flash::push(&session, Flash::info("Your cart is empty")).await;
    Redirect::to("/cart")
}
