//! Session-related types.
//!
//! Everything the storefront remembers about a visitor lives in the
//! server-side session under the keys in [`keys`].

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use bazaar_core::Role;

use crate::backend::{AccessToken, AccountProfile, LoginResult};

/// The signed-in account: profile, bearer token and role.
///
/// Stored under [`keys::USER_STORAGE`]. Cleared on logout and whenever the
/// backend answers 401/403.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user: AccountProfile,
    pub token: AccessToken,
    pub role: Role,
}

impl UserSession {
    /// Whether the account may use the seller dashboard.
    #[must_use]
    pub const fn is_seller(&self) -> bool {
        matches!(self.role, Role::Seller)
    }

    /// Whether the account may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<LoginResult> for UserSession {
    fn from(login: LoginResult) -> Self {
        Self {
            role: login.profile.role,
            user: login.profile,
            token: login.token,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in account.
    pub const USER_STORAGE: &str = "user-storage";

    /// Key for the last cart snapshot.
    pub const CART: &str = "cart-storage";

    /// Key for the last wishlist snapshot.
    pub const WISHLIST: &str = "wishlist-storage";

    /// Key for the in-progress checkout draft.
    pub const CHECKOUT: &str = "checkout-draft";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}

/// Read the signed-in account, if any.
///
/// A session that fails to deserialize is treated as signed out.
pub async fn current_user(session: &Session) -> Option<UserSession> {
    session
        .get::<UserSession>(keys::USER_STORAGE)
        .await
        .ok()
        .flatten()
}

/// Store the signed-in account, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_in(
    session: &Session,
    user: &UserSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::USER_STORAGE, user).await
}

/// Forget the signed-in account and everything derived from it.
///
/// Flash messages survive so the login page can explain what happened.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    for key in [keys::USER_STORAGE, keys::CART, keys::WISHLIST, keys::CHECKOUT] {
        session.remove_value(key).await?;
    }
    Ok(())
}
