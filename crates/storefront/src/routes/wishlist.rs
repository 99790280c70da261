//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use bazaar_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::flash::{self, Flash};
use crate::routes::{PageContext, back_to, finish};
use crate::services::{CartStore, WishlistSnapshot, WishlistStore};
use crate::state::AppState;

/// Any wishlist action: the product and where to go afterwards.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
    pub next: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub ctx: PageContext,
    pub wishlist: WishlistSnapshot,
    pub stale: bool,
}

/// Display the wishlist.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
) -> Result<impl IntoResponse> {
    let store = WishlistStore::new(state.backend(), &session, &user);
    let (wishlist, stale) = match store.fetch().await {
        Ok(wishlist) => (wishlist, false),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh wishlist");
            (store.cached().await, true)
        }
    };

    ctx.saved = wishlist
        .items
        .iter()
        .map(|item| item.product_id.clone())
        .collect();
    Ok(WishlistShowTemplate {
        ctx,
        wishlist,
        stale,
    })
}

/// Save a product.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let store = WishlistStore::new(state.backend(), &session, &user);
    let result = store.add(&form.product_id).await;
    finish(
        &session,
        result,
        "Saved to your wishlist",
        back_to(form.next.as_deref(), "/wishlist"),
    )
    .await
}

/// Remove a saved product.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let store = WishlistStore::new(state.backend(), &session, &user);
    let result = store.remove(&form.product_id).await;
    finish(
        &session,
        result,
        "Removed from your wishlist",
        back_to(form.next.as_deref(), "/wishlist"),
    )
    .await
}

/// Save or unsave a product, whichever applies.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let store = WishlistStore::new(state.backend(), &session, &user);
    let to = back_to(form.next.as_deref(), "/wishlist");
    match store.toggle(&form.product_id).await {
        Ok(true) => flash::push(&session, Flash::success("Saved to your wishlist")).await,
        Ok(false) => flash::push(&session, Flash::info("Removed from your wishlist")).await,
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Wishlist toggle failed");
            flash::push(&session, Flash::error(e.user_message())).await;
        }
    }
    Ok(Redirect::to(to))
}

/// Move a saved product into the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let cart = CartStore::new(state.backend(), &session, &user);
    let store = WishlistStore::new(state.backend(), &session, &user);
    let result = store.move_to_cart(&form.product_id, &cart).await;
    finish(
        &session,
        result,
        "Moved to your cart",
        back_to(form.next.as_deref(), "/wishlist"),
    )
    .await
}
