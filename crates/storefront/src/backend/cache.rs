//! Cache types for catalog responses.

use std::time::Duration;

use bazaar_core::ProductId;
use moka::future::Cache;

use super::types::{ListQuery, Page, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ListQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
}

/// Build the catalog cache (5 minute TTL).
pub fn build() -> Cache<CacheKey, CacheValue> {
    Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(300))
        .build()
}
