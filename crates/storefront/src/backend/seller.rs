//! Seller dashboard endpoints.

use bazaar_core::{OrderId, OrderStatus, ProductId};
use serde_json::json;
use tracing::instrument;

use super::orders::ORDER_KEYS;
use super::{
    AccessToken, BackendClient, BackendError, ListQuery, Order, Page, Product, ProductInput,
    SellerStats, extract, normalize, segment,
};

const PRODUCT_KEYS: [&str; 2] = ["products", "items"];

impl BackendClient {
    /// Headline numbers for the seller dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_seller_stats(&self, token: &AccessToken) -> Result<SellerStats, BackendError> {
        let payload = self.get("/seller/dashboard", Some(token), &[]).await?;
        Ok(normalize::seller_stats(&payload))
    }

    /// The seller's own products, including unapproved ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_seller_products(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<Product>, BackendError> {
        let payload = self
            .get("/seller/products", Some(token), &query.to_pairs())
            .await?;
        Ok(normalize::page(&payload, &PRODUCT_KEYS, query.page.unwrap_or(1), |record| {
            normalize::product(record, self.images())
        }))
    }

    /// One of the seller's products, for the edit form.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_seller_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
    ) -> Result<Product, BackendError> {
        let path = format!("/seller/products/{}", segment(id.as_str())?);
        let payload = self.get(&path, Some(token), &[]).await?;
        let record = extract::object(&payload, &["/product"]).unwrap_or(&payload);
        normalize::product(record, self.images())
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))
    }

    /// Create a product. New products usually await admin approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the product.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_seller_product(
        &self,
        token: &AccessToken,
        input: &ProductInput,
    ) -> Result<(), BackendError> {
        self.post("/seller/products", Some(token), &input.to_json())
            .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the update.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_seller_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<(), BackendError> {
        let path = format!("/seller/products/{}", segment(id.as_str())?);
        self.put(&path, Some(token), &input.to_json()).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_seller_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        let path = format!("/seller/products/{}", segment(id.as_str())?);
        self.delete(&path, Some(token)).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Orders containing the seller's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_seller_orders(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<Order>, BackendError> {
        let payload = self
            .get("/seller/orders", Some(token), &query.to_pairs())
            .await?;
        Ok(normalize::page(&payload, &ORDER_KEYS, query.page.unwrap_or(1), |record| {
            normalize::order(record, self.images())
        }))
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_seller_order_status(
        &self,
        token: &AccessToken,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        let path = format!("/seller/orders/{}/status", segment(id.as_str())?);
        self.put(
            &path,
            Some(token),
            &json!({ "status": status.as_str() }),
        )
        .await?;
        Ok(())
    }
}
