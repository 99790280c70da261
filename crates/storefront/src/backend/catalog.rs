//! Public catalog: product listings and product detail.

use bazaar_core::ProductId;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::normalize;
use super::{BackendClient, BackendError, ListQuery, Page, Product, segment};

/// Keys the product list may arrive under.
const PRODUCT_KEYS: [&str; 3] = ["products", "items", "results"];

impl BackendClient {
    /// Get a page of approved products.
    ///
    /// Unsearched listings are cached; searches always hit the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ListQuery) -> Result<Page<Product>, BackendError> {
        let cache_key = CacheKey::Products(query.clone());
        let cacheable = query.search.as_deref().is_none_or(|s| s.trim().is_empty());

        if cacheable
            && let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let payload = self.get("/products", None, &query.to_pairs()).await?;
        let page = normalize::page(&payload, &PRODUCT_KEYS, query.page.unwrap_or(1), |record| {
            normalize::product(record, self.images())
        });

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/products/{}", segment(id.as_str())?);
        let payload = self.get(&path, None, &[]).await?;
        let record = super::extract::object(&payload, &["/product"]).unwrap_or(&payload);
        let product = normalize::product(record, self.images())
            .ok_or_else(|| BackendError::NotFound(format!("Product not found: {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop cached catalog entries after a seller or admin edit.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}
