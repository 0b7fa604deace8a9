use super::types::Product;
use super::ProductSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTP client for a fakestoreapi.com-compatible `/products/` endpoint.
pub struct FakeStoreApi {
    client: Client,
    base_url: String,
}

impl FakeStoreApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn products_url(&self) -> String {
        format!("{}/products/", self.base_url)
    }
}

#[async_trait]
impl ProductSource for FakeStoreApi {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let url = self.products_url();
        let resp = self.client.get(&url).send().await
            .context("GET products failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GET products failed ({}): {}", status, body);
        }

        let products: Vec<Product> = resp.json().await
            .context("failed to parse products response")?;
        tracing::debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
