//! Port interfaces for catalog data

use async_trait::async_trait;
use storefront_domain::{Product, ProductUpdate, Result};

/// Upstream source of catalog data
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch the full product listing
    async fn fetch_products(&self) -> Result<Vec<Product>>;

    /// Fetch one product by its URL slug
    ///
    /// An unknown slug surfaces as an API protocol failure with status 404.
    async fn fetch_product_by_slug(&self, slug: &str) -> Result<Product>;

    /// Apply a partial update and return the stored product
    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<Product>;
}
