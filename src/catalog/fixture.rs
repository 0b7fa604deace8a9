use super::types::Product;
use super::ProductSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Products read from a local JSON file with the same shape as the API response.
pub struct FixtureFile {
    path: PathBuf,
}

impl FixtureFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ProductSource for FixtureFile {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let content = tokio::fs::read_to_string(&self.path).await
            .with_context(|| format!("Failed to read product fixture: {}", self.path.display()))?;
        let products: Vec<Product> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse product fixture: {}", self.path.display()))?;
        Ok(products)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
