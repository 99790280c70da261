//! Cart store.
//!
//! Every mutation goes to the backend first and is followed by a full
//! refetch. When the refetch fails, the cached snapshot is patched locally
//! so the page still reflects what the shopper did.

use bazaar_core::{CartItemId, CurrencyCode, Price, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::backend::{BackendClient, BackendError, CartItem};
use crate::models::UserSession;
use crate::models::session_keys;

use super::{load_snapshot, store_snapshot};

/// The cart as last seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        let currency = self
            .items
            .first()
            .map_or(CurrencyCode::default(), |item| item.price.currency_code);
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Price::zero(currency), |acc, line| acc + line)
    }

    /// Number of units, for the header badge.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names of lines that can no longer be bought.
    #[must_use]
    pub fn unavailable(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| !item.available)
            .map(|item| item.name.clone())
            .collect()
    }

    /// The line holding a product, if any.
    #[must_use]
    pub fn line_for(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    fn remove(&mut self, item_id: &CartItemId) {
        self.items.retain(|item| &item.id != item_id);
    }

    fn set_quantity(&mut self, item_id: &CartItemId, quantity: u32) {
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == item_id) {
            item.quantity = quantity.max(1);
        }
    }
}

/// The signed-in shopper's cart.
pub struct CartStore<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
    user: &'a UserSession,
}

impl<'a> CartStore<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient, session: &'a Session, user: &'a UserSession) -> Self {
        Self {
            backend,
            session,
            user,
        }
    }

    /// The last snapshot, without touching the backend.
    pub async fn cached(&self) -> CartSnapshot {
        load_snapshot(self.session, session_keys::CART).await
    }

    /// Fetch the cart and remember it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails; the cached snapshot is
    /// left as it was.
    #[instrument(skip(self), fields(user_id = %self.user.user.id))]
    pub async fn fetch(&self) -> Result<CartSnapshot, BackendError> {
        let items = self.backend.get_cart(&self.user.token).await?;
        let snapshot = CartSnapshot { items };
        store_snapshot(self.session, session_keys::CART, &snapshot).await;
        Ok(snapshot)
    }

    /// Add a product, then resync.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the add.
    #[instrument(skip(self), fields(user_id = %self.user.user.id, product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<CartSnapshot, BackendError> {
        self.backend
            .add_to_cart(&self.user.token, product_id, quantity)
            .await?;
        // A failed refetch leaves nothing to patch: the new line's details are unknown
        self.resync(|_| {}).await
    }

    /// Change a line's quantity (minimum 1), then resync.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the update.
    #[instrument(skip(self), fields(user_id = %self.user.user.id, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, BackendError> {
        let quantity = quantity.max(1);
        self.backend
            .update_cart_item(&self.user.token, item_id, quantity)
            .await?;
        self.resync(|snapshot| snapshot.set_quantity(item_id, quantity))
            .await
    }

    /// Remove a line, then resync.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the removal.
    #[instrument(skip(self), fields(user_id = %self.user.user.id, item_id = %item_id))]
    pub async fn remove(&self, item_id: &CartItemId) -> Result<CartSnapshot, BackendError> {
        self.backend
            .remove_cart_item(&self.user.token, item_id)
            .await?;
        self.resync(|snapshot| snapshot.remove(item_id)).await
    }

    /// Empty the cart.
    ///
    /// The backend call is best-effort; the local snapshot is always cleared.
    #[instrument(skip(self), fields(user_id = %self.user.user.id))]
    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear_cart(&self.user.token).await {
            warn!(error = %e, "Failed to clear cart on backend");
        }
        store_snapshot(self.session, session_keys::CART, &CartSnapshot::default()).await;
    }

    /// Refetch after a successful mutation, patching the cached snapshot with
    /// `patch` if the refetch fails.
    ///
    /// Auth failures still propagate so the session gets cleared.
    async fn resync(
        &self,
        patch: impl FnOnce(&mut CartSnapshot),
    ) -> Result<CartSnapshot, BackendError> {
        match self.fetch().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                warn!(error = %e, "Cart refetch failed, patching cached snapshot");
                let mut snapshot = self.cached().await;
                patch(&mut snapshot);
                store_snapshot(self.session, session_keys::CART, &snapshot).await;
                Ok(snapshot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, price: i64, quantity: u32, available: bool) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(format!("p-{id}")),
            name: format!("Item {id}"),
            image: String::new(),
            price: Price::inr(Decimal::from(price)),
            quantity,
            available,
        }
    }

    #[test]
    fn test_snapshot_totals() {
        let snapshot = CartSnapshot {
            items: vec![line("a", 120, 2, true), line("b", 75, 1, false)],
        };
        assert_eq!(snapshot.subtotal().amount, Decimal::from(315));
        assert_eq!(snapshot.count(), 3);
        assert_eq!(snapshot.unavailable(), vec!["Item b".to_owned()]);
        assert!(snapshot.line_for(&ProductId::new("p-a")).is_some());
    }

    #[test]
    fn test_count_saturates() {
        let snapshot = CartSnapshot {
            items: vec![line("a", 1, u32::MAX, true), line("b", 1, 5, true)],
        };
        assert_eq!(snapshot.count(), u32::MAX);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.subtotal().is_zero());
        assert_eq!(snapshot.count(), 0);
    }

    #[test]
    fn test_local_patches() {
        let mut snapshot = CartSnapshot {
            items: vec![line("a", 10, 1, true), line("b", 20, 4, true)],
        };
        snapshot.set_quantity(&CartItemId::new("b"), 0);
        assert_eq!(snapshot.items[1].quantity, 1);

        snapshot.remove(&CartItemId::new("a"));
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id.as_str(), "b");
    }
}
