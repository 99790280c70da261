//! Session-scoped stores and the checkout orchestrator.
//!
//! # Services
//!
//! - `cart` - Cart store: fetch, add, update, remove, clear with resync
//! - `wishlist` - Wishlist store: fetch, add, remove, toggle, move to cart
//! - `checkout` - Shipping → payment → review wizard, order placement and
//!   online payment
//!
//! Stores are per-request views: each one borrows the shared
//! [`BackendClient`](crate::backend::BackendClient), the visitor's session and
//! the signed-in account. Their last snapshot is kept in the session so
//! header badges render without a backend round trip.

pub mod cart;
pub mod checkout;
pub mod wishlist;

pub use cart::{CartSnapshot, CartStore};
pub use checkout::{
    CheckoutDraft, CheckoutError, CheckoutOrchestrator, CheckoutReview, CheckoutStep,
    PendingPayment, PlacedOrder,
};
pub use wishlist::{WishlistSnapshot, WishlistStore};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

/// Load a snapshot from the session, or its default when absent or unreadable.
async fn load_snapshot<T>(session: &Session, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match session.get::<T>(key).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, key, "Discarding unreadable session snapshot");
            T::default()
        }
    }
}

/// Store a snapshot in the session. Failures only cost a stale badge.
async fn store_snapshot<T>(session: &Session, key: &str, value: &T)
where
    T: Serialize + Send + Sync,
{
    if let Err(e) = session.insert(key, value).await {
        tracing::warn!(error = %e, key, "Failed to store session snapshot");
    }
}
