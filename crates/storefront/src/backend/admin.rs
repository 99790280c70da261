//! Admin console endpoints.

use bazaar_core::{AccountStatus, ApprovalStatus, OrderId, OrderStatus, ProductId, SellerId, UserId};
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::orders::ORDER_KEYS;
use super::{
    AccessToken, AdminStats, BackendClient, BackendError, ListQuery, Order, Page, Product,
    SellerRecord, SiteSetting, UserRecord, normalize, segment,
};

impl BackendClient {
    /// Marketplace-wide analytics.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_admin_stats(&self, token: &AccessToken) -> Result<AdminStats, BackendError> {
        let payload = self.get("/admin/dashboard", Some(token), &[]).await?;
        Ok(normalize::admin_stats(&payload, self.images()))
    }

    /// All user accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_admin_users(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<UserRecord>, BackendError> {
        let payload = self.get("/admin/users", Some(token), &query.to_pairs()).await?;
        Ok(normalize::page(
            &payload,
            &["users", "items"],
            query.page.unwrap_or(1),
            normalize::user_record,
        ))
    }

    /// Block or unblock a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %id, status = %status))]
    pub async fn set_user_status(
        &self,
        token: &AccessToken,
        id: &UserId,
        status: AccountStatus,
    ) -> Result<(), BackendError> {
        let body = json!({
            "status": status.as_str(),
            "isBlocked": status == AccountStatus::Blocked,
        });
        let path = format!("/admin/users/{}/status", segment(id.as_str())?);
        self.put(&path, Some(token), &body).await?;
        Ok(())
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn delete_user(&self, token: &AccessToken, id: &UserId) -> Result<(), BackendError> {
        let path = format!("/admin/users/{}", segment(id.as_str())?);
        self.delete(&path, Some(token)).await?;
        Ok(())
    }

    /// All seller accounts with their approval state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_admin_sellers(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<SellerRecord>, BackendError> {
        let payload = self.get("/admin/sellers", Some(token), &query.to_pairs()).await?;
        Ok(normalize::page(
            &payload,
            &["sellers", "items"],
            query.page.unwrap_or(1),
            normalize::seller_record,
        ))
    }

    /// Approve or reject a seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(seller_id = %id, approval = %approval))]
    pub async fn set_seller_approval(
        &self,
        token: &AccessToken,
        id: &SellerId,
        approval: ApprovalStatus,
    ) -> Result<(), BackendError> {
        let body = json!({
            "status": approval.as_str(),
            "isApproved": approval == ApprovalStatus::Approved,
        });
        let path = format!("/admin/sellers/{}/approval", segment(id.as_str())?);
        self.put(&path, Some(token), &body).await?;
        Ok(())
    }

    /// All products, whatever their approval state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_admin_products(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<Product>, BackendError> {
        let payload = self
            .get("/admin/products", Some(token), &query.to_pairs())
            .await?;
        Ok(normalize::page(
            &payload,
            &["products", "items"],
            query.page.unwrap_or(1),
            |record| normalize::product(record, self.images()),
        ))
    }

    /// Approve or reject a product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id, approval = %approval))]
    pub async fn set_product_approval(
        &self,
        token: &AccessToken,
        id: &ProductId,
        approval: ApprovalStatus,
    ) -> Result<(), BackendError> {
        let body = json!({
            "status": approval.as_str(),
            "isApproved": approval == ApprovalStatus::Approved,
        });
        let path = format!("/admin/products/{}/status", segment(id.as_str())?);
        self.put(&path, Some(token), &body).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Delete any product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        let path = format!("/admin/products/{}", segment(id.as_str())?);
        self.delete(&path, Some(token)).await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// All orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_admin_orders(
        &self,
        token: &AccessToken,
        query: &ListQuery,
    ) -> Result<Page<Order>, BackendError> {
        let payload = self.get("/admin/orders", Some(token), &query.to_pairs()).await?;
        Ok(normalize::page(&payload, &ORDER_KEYS, query.page.unwrap_or(1), |record| {
            normalize::order(record, self.images())
        }))
    }

    /// Move any order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn set_order_status(
        &self,
        token: &AccessToken,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), BackendError> {
        let path = format!("/admin/orders/{}/status", segment(id.as_str())?);
        self.put(
            &path,
            Some(token),
            &json!({ "status": status.as_str() }),
        )
        .await?;
        Ok(())
    }

    /// Site settings as key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_settings(&self, token: &AccessToken) -> Result<Vec<SiteSetting>, BackendError> {
        let payload = self.get("/admin/settings", Some(token), &[]).await?;
        Ok(normalize::settings(&payload))
    }

    /// Replace site settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the settings.
    #[instrument(skip(self, token, settings), fields(count = settings.len()))]
    pub async fn update_settings(
        &self,
        token: &AccessToken,
        settings: &[SiteSetting],
    ) -> Result<(), BackendError> {
        let body: Map<String, Value> = settings
            .iter()
            .map(|s| (s.key.clone(), Value::String(s.value.clone())))
            .collect();
        self.put("/admin/settings", Some(token), &Value::Object(body))
            .await?;
        Ok(())
    }
}
