use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_FILE: &str = ".env";
const BASE_URL_VAR: &str = "CATALOG_BASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Local JSON file to read products from instead of the API.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://fakestoreapi.com".to_string()
}
fn default_request_timeout() -> u64 { 10_000 }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout(),
            fixture: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,
    /// Artificial latency between a proximity signal and the page increment.
    #[serde(default = "default_page_advance_delay")]
    pub page_advance_delay_ms: u64,
    /// Rows beyond the visible area that still count as "near" the viewport.
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin_rows: usize,
}

fn default_page_size() -> usize { 6 }
fn default_search_debounce() -> u64 { 300 }
fn default_page_advance_delay() -> u64 { 1500 }
fn default_proximity_margin() -> usize { 2 }

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce(),
            page_advance_delay_ms: default_page_advance_delay(),
            proximity_margin_rows: default_proximity_margin(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
    /// Abort pending automatic retries once a load succeeds.
    #[serde(default)]
    pub cancel_on_success: bool,
}

fn default_max_auto_retries() -> u32 { 3 }
fn default_retry_delay() -> u64 { 2000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_auto_retries: default_max_auto_retries(),
            delay_ms: default_retry_delay(),
            cancel_on_success: false,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ListConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn page_advance_delay(&self) -> Duration {
        Duration::from_millis(self.page_advance_delay_ms)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        if config.list.page_size == 0 {
            anyhow::bail!("list.page_size must be at least 1");
        }
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// The data source location is the only thing the environment may change.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_VAR) {
            let url = url.trim();
            if !url.is_empty() {
                tracing::info!(base_url = url, "base URL overridden from environment");
                self.source.base_url = url.to_string();
            }
        }
    }
}

/// Value of `--config <path>` / `--config=<path>`, if given.
pub fn config_path_from_args(args: impl IntoIterator<Item = String>) -> Result<Option<PathBuf>> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let Some(path) = args.next() else {
                anyhow::bail!("--config needs a path");
            };
            return Ok(Some(PathBuf::from(path)));
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}

/// KEY=VALUE pairs from a .env file body; comments, blank lines and BOM are skipped.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
