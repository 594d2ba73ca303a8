//! Product catalog: port and cache-aside service

pub mod ports;
mod service;

pub use service::CatalogService;

/// Cache keys used by the catalog.
///
/// Every key shares the `products:` prefix so a single pattern invalidation
/// drops all catalog data after a write.
pub mod cache_keys {
    pub use storefront_domain::constants::PRODUCTS_KEY_PREFIX;

    pub const ALL_PRODUCTS: &str = "products:all";
    pub const IN_STOCK_PRODUCTS: &str = "products:inStock";

    pub fn product_by_slug(slug: &str) -> String {
        format!("{PRODUCTS_KEY_PREFIX}slug:{slug}")
    }
}
