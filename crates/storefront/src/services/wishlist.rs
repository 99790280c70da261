//! Wishlist store.

use bazaar_core::ProductId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::backend::{BackendClient, BackendError, WishlistItem};
use crate::models::UserSession;
use crate::models::session_keys;

use super::cart::CartStore;
use super::{load_snapshot, store_snapshot};

/// The wishlist as last seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistSnapshot {
    pub items: Vec<WishlistItem>,
}

impl WishlistSnapshot {
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|item| &item.product_id != product_id);
    }
}

/// The signed-in shopper's wishlist.
pub struct WishlistStore<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
    user: &'a UserSession,
}

impl<'a> WishlistStore<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, session: &'a Session, user: &'a UserSession) -> Self {
        Self {
            backend,
            session,
            user,
        }
    }

    /// The last snapshot, without touching the backend.
    pub async fn cached(&self) -> WishlistSnapshot {
        load_snapshot(self.session, session_keys::WISHLIST).await
    }

    /// Fetch the wishlist and remember it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user.user.id))]
    pub async fn fetch(&self) -> Result<WishlistSnapshot, BackendError> {
        let items = self.backend.get_wishlist(&self.user.token).await?;
        let snapshot = WishlistSnapshot { items };
        store_snapshot(self.session, session_keys::WISHLIST, &snapshot).await;
        Ok(snapshot)
    }

    /// Save a product, then resync.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the add.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<WishlistSnapshot, BackendError> {
        self.backend
            .add_to_wishlist(&self.user.token, product_id)
            .await?;
        self.resync(|_| {}).await
    }

    /// Remove a product, then resync.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<WishlistSnapshot, BackendError> {
        self.backend
            .remove_from_wishlist(&self.user.token, product_id)
            .await?;
        self.resync(|snapshot| snapshot.remove(product_id)).await
    }

    /// Add the product if it is not saved, remove it if it is.
    ///
    /// Membership is judged from the cached snapshot. Returns whether the
    /// product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the change.
    pub async fn toggle(&self, product_id: &ProductId) -> Result<bool, BackendError> {
        if self.cached().await.contains(product_id) {
            self.remove(product_id).await?;
            Ok(false)
        } else {
            self.add(product_id).await?;
            Ok(true)
        }
    }

    /// Move a saved product into the cart.
    ///
    /// The cart add must succeed; removing the wishlist entry afterwards is
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be added to the cart.
    #[instrument(skip(self, cart), fields(product_id = %product_id))]
    pub async fn move_to_cart(
        &self,
        product_id: &ProductId,
        cart: &CartStore<'_>,
    ) -> Result<WishlistSnapshot, BackendError> {
        cart.add(product_id, 1).await?;

        match self.remove(product_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                warn!(error = %e, "Added to cart but wishlist removal failed");
                Ok(self.cached().await)
            }
        }
    }

    async fn resync(
        &self,
        patch: impl FnOnce(&mut WishlistSnapshot),
    ) -> Result<WishlistSnapshot, BackendError> {
        match self.fetch().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                warn!(error = %e, "Wishlist refetch failed, patching cached snapshot");
                let mut snapshot = self.cached().await;
                patch(&mut snapshot);
                store_snapshot(self.session, session_keys::WISHLIST, &snapshot).await;
                Ok(snapshot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::Price;

    use super::*;

    #[test]
    fn test_snapshot_membership() {
        let mut snapshot = WishlistSnapshot {
            items: vec![WishlistItem {
                product_id: ProductId::new("p1"),
                name: "Brass Lamp".to_owned(),
                image: String::new(),
                price: Price::inr(rust_decimal::Decimal::from(899)),
                available: true,
            }],
        };
        assert!(snapshot.contains(&ProductId::new("p1")));
        assert!(!snapshot.contains(&ProductId::new("p2")));

        snapshot.remove(&ProductId::new("p1"));
        assert_eq!(snapshot.count(), 0);
    }
}
