pub mod fake_store;
pub mod fixture;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::Product;

/// Read-only source of the whole product collection. No server-side
/// filtering or paging: one call returns everything.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>>;

    /// Where the products come from, for logs and the status line.
    fn describe(&self) -> String;
}
