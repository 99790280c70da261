//! Cart endpoints.
//!
//! Mutations return nothing useful: the backend's mutation responses are
//! even less consistent than its reads, so callers refetch.

use bazaar_core::{CartItemId, ProductId};
use serde_json::json;
use tracing::instrument;

use super::{AccessToken, BackendClient, BackendError, CartItem, extract, normalize, segment};

/// Keys the cart lines may arrive under (after `carts`).
pub const CART_KEYS: [&str; 4] = ["items", "cartItems", "products", "cart"];

impl BackendClient {
    /// Get the shopper's cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &AccessToken) -> Result<Vec<CartItem>, BackendError> {
        let payload = self.get("/cart", Some(token), &[]).await?;

        Ok(extract::list(&payload, &CART_KEYS)
            .iter()
            .filter_map(|record| normalize::cart_item(record, self.images()))
            .collect())
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the line (e.g. out of stock).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.post(
            "/cart",
            Some(token),
            &json!({ "productId": product_id, "quantity": quantity.max(1) }),
        )
        .await?;
        Ok(())
    }

    /// Set the quantity of a cart line. Quantities below 1 are raised to 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &AccessToken,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let path = format!("/cart/{}", segment(item_id.as_str())?);
        self.put(
            &path,
            Some(token),
            &json!({ "quantity": quantity.max(1) }),
        )
        .await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &AccessToken,
        item_id: &CartItemId,
    ) -> Result<(), BackendError> {
        let path = format!("/cart/{}", segment(item_id.as_str())?);
        self.delete(&path, Some(token)).await?;
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &AccessToken) -> Result<(), BackendError> {
        self.delete("/cart", Some(token)).await?;
        Ok(())
    }
}
