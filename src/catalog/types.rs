use serde::Deserialize;

/// One catalog entry as served by the products endpoint.
///
/// Only `title`, `description` and `category` take part in filtering; the
/// remaining fields are carried for display.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u32,
}

impl Product {
    /// Minimal product, mostly for fixtures and tests.
    pub fn new(id: u64, title: &str, description: &str, category: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            price: 0.0,
            image: String::new(),
            rating: None,
        }
    }
}
