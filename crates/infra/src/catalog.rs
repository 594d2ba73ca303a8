//! HTTP implementation of the catalog port

use async_trait::async_trait;
use storefront_core::CatalogApi;
use storefront_domain::{Product, ProductUpdate, Result};
use urlencoding::encode;

use crate::http::ApiClient;

/// Catalog backed by the storefront REST API
///
/// - `GET /products`
/// - `GET /products/slug/{slug}`
/// - `PATCH /products/{id}`
#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: ApiClient,
}

impl HttpCatalogApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.client.get_json("/products").await
    }

    async fn fetch_product_by_slug(&self, slug: &str) -> Result<Product> {
        self.client.get_json(&format!("/products/slug/{}", encode(slug))).await
    }

    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<Product> {
        let payload = self.client.patch(&format!("/products/{}", encode(id)), update).await?;
        payload.decode()
    }
}
