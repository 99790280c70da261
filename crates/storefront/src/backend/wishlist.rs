//! Wishlist endpoints. Entries are keyed by product id.

use bazaar_core::ProductId;
use serde_json::json;
use tracing::instrument;

use super::{AccessToken, BackendClient, BackendError, WishlistItem, extract, normalize, segment};

/// Keys the wishlist entries may arrive under (after `carts`).
pub const WISHLIST_KEYS: [&str; 4] = ["wishlist", "items", "products", "wishlistItems"];

impl BackendClient {
    /// Get the shopper's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_wishlist(&self, token: &AccessToken) -> Result<Vec<WishlistItem>, BackendError> {
        let payload = self.get("/wishlist", Some(token), &[]).await?;

        let mut items: Vec<WishlistItem> = Vec::new();
        for item in extract::list(&payload, &WISHLIST_KEYS)
            .iter()
            .filter_map(|record| normalize::wishlist_item(record, self.images()))
        {
            if !items.iter().any(|existing| existing.product_id == item.product_id) {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Save a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        self.post("/wishlist", Some(token), &json!({ "productId": product_id }))
            .await?;
        Ok(())
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        let path = format!("/wishlist/{}", segment(product_id.as_str())?);
        self.delete(&path, Some(token)).await?;
        Ok(())
    }
}
