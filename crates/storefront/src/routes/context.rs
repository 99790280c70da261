//! Data every full page needs for its header and footer.

use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use bazaar_core::ProductId;
use tower_sessions::Session;

use crate::middleware::CspNonce;
use crate::models::flash::{self, Flash};
use crate::models::session::{UserSession, current_user};
use crate::models::session_keys;
use crate::services::{CartSnapshot, WishlistSnapshot};
use crate::state::AppState;

/// Header, navigation and flash data for `base.html`.
///
/// Extracting it consumes pending flash messages. A handler that extracts
/// it and then redirects instead of rendering should use
/// [`PageContext::redirect`] so the messages survive.
pub struct PageContext {
    pub store_name: String,
    pub user: Option<UserSession>,
    pub flashes: Vec<Flash>,
    pub cart_count: u32,
    /// Products on the wishlist, from the last snapshot.
    pub saved: Vec<ProductId>,
    pub nonce: String,
    /// Current path, for highlighting navigation.
    pub path: String,
    session: Option<Session>,
}

impl PageContext {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.user.as_ref().is_some_and(UserSession::is_seller)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserSession::is_admin)
    }

    /// Display name of the signed-in account.
    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", |user| {
            if user.user.name.is_empty() {
                user.user.email.as_str()
            } else {
                user.user.name.as_str()
            }
        })
    }

    #[must_use]
    pub fn wishlist_count(&self) -> usize {
        self.saved.len()
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn is_saved(&self, product_id: &str) -> bool {
        self.saved.iter().any(|id| id.as_str() == product_id)
    }

    /// Whether the current page lives under `prefix`.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path.starts_with(prefix)
        }
    }

    /// Redirect without rendering, keeping the flash messages for the next page.
    pub async fn redirect(self, to: &str) -> Redirect {
        self.keep_flashes().await;
        Redirect::to(to)
    }

    /// Put unrendered flash messages back in the session.
    pub async fn keep_flashes(self) {
        if let Some(session) = &self.session {
            for message in self.flashes {
                flash::push(session, message).await;
            }
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let session = parts.extensions.get::<Session>().cloned();

        let (user, flashes, cart_count, saved) = match &session {
            Some(session) => {
                let user = current_user(session).await;
                let flashes = flash::take(session).await;
                let (cart_count, saved) = if user.is_some() {
                    snapshot_badges(session).await
                } else {
                    (0, Vec::new())
                };
                (user, flashes, cart_count, saved)
            }
            None => (None, Vec::new(), 0, Vec::new()),
        };

        Ok(Self {
            store_name: state.config().store_name.clone(),
            user,
            flashes,
            cart_count,
            saved,
            nonce,
            path: parts.uri.path().to_owned(),
            session,
        })
    }
}

/// Cart count and saved products from the last snapshots, without a
/// backend call.
async fn snapshot_badges(session: &Session) -> (u32, Vec<ProductId>) {
    let cart = session
        .get::<CartSnapshot>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .map_or(0, |cart| cart.count());
    let wishlist = session
        .get::<WishlistSnapshot>(session_keys::WISHLIST)
        .await
        .ok()
        .flatten()
        .map(|wishlist| {
            wishlist
                .items
                .into_iter()
                .map(|item| item.product_id)
                .collect()
        })
        .unwrap_or_default();
    (cart, wishlist)
}
