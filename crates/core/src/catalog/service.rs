//! Catalog service - cache-aside reads over the catalog port

use std::sync::Arc;

use storefront_common::cache::{CacheConfig, CacheCoordinator, CacheTtl, TtlCache};
use storefront_common::resilience::{Clock, SystemClock};
use storefront_domain::{Product, ProductUpdate, Result, StorefrontError};
use tracing::{debug, instrument};

use super::cache_keys;
use super::ports::CatalogApi;

/// Catalog reads served through the TTL cache
///
/// Listings and single products live in separate stores because they hold
/// different value types; both use the `products:` key space and are
/// invalidated together after a write.
pub struct CatalogService<C = SystemClock>
where
    C: Clock,
{
    api: Arc<dyn CatalogApi>,
    listings: CacheCoordinator<Vec<Product>, C>,
    products: CacheCoordinator<Product, C>,
}

impl CatalogService<SystemClock> {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self::with_caches(
            api,
            TtlCache::new(CacheConfig::default()),
            TtlCache::new(CacheConfig::default()),
        )
    }
}

impl<C> CatalogService<C>
where
    C: Clock + Clone,
{
    /// Build the service over caller-owned stores, e.g. to share them with
    /// an [`ExpirySweeper`](storefront_common::cache::ExpirySweeper).
    pub fn with_caches(
        api: Arc<dyn CatalogApi>,
        listings: TtlCache<Vec<Product>, C>,
        products: TtlCache<Product, C>,
    ) -> Self {
        Self {
            api,
            listings: CacheCoordinator::new(listings),
            products: CacheCoordinator::new(products),
        }
    }

    pub fn listing_cache(&self) -> &TtlCache<Vec<Product>, C> {
        self.listings.cache()
    }

    pub fn product_cache(&self) -> &TtlCache<Product, C> {
        self.products.cache()
    }

    /// Full product listing, cached for five minutes
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let api = Arc::clone(&self.api);
        self.listings
            .get_or_compute(cache_keys::ALL_PRODUCTS, CacheTtl::Long, || async move {
                api.fetch_products().await
            })
            .await
    }

    /// Products currently in stock
    ///
    /// Stock changes constantly, so this view uses the short TTL and is
    /// filtered from a fresh listing rather than the cached one.
    #[instrument(skip(self))]
    pub async fn list_in_stock(&self) -> Result<Vec<Product>> {
        let api = Arc::clone(&self.api);
        self.listings
            .get_or_compute(cache_keys::IN_STOCK_PRODUCTS, CacheTtl::Short, || async move {
                let products = api.fetch_products().await?;
                Ok(products.into_iter().filter(|p| p.in_stock == Some(true)).collect())
            })
            .await
    }

    /// One product by slug
    ///
    /// Returns `Ok(None)` when the upstream reports 404; a missing product is
    /// not cached, so it shows up as soon as it is published.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(StorefrontError::InvalidInput("product slug must not be empty".into()));
        }

        let api = Arc::clone(&self.api);
        let key = cache_keys::product_by_slug(slug);
        let result = self
            .products
            .get_or_compute(&key, CacheTtl::Long, || async move {
                api.fetch_product_by_slug(slug).await
            })
            .await;

        match result {
            Ok(product) => Ok(Some(product)),
            Err(err) if err.as_api().is_some_and(|api| api.is_not_found()) => {
                debug!(slug, "product not found upstream");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Write through to the upstream, then drop every cached catalog entry
    ///
    /// Nothing is invalidated when the write fails.
    #[instrument(skip(self, update))]
    pub async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<Product> {
        if id.trim().is_empty() {
            return Err(StorefrontError::InvalidInput("product id must not be empty".into()));
        }

        let product = self.api.update_product(id, update).await?;
        let removed = self.invalidate_all();
        debug!(id, removed, "catalog cache invalidated after update");
        Ok(product)
    }

    /// Drop all cached catalog data, returning the number of entries removed
    pub fn invalidate_all(&self) -> usize {
        self.listings.invalidate_by_pattern(cache_keys::PRODUCTS_KEY_PREFIX)
            + self.products.invalidate_by_pattern(cache_keys::PRODUCTS_KEY_PREFIX)
    }
}
