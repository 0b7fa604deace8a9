use anyhow::Result;
use catalog_browser::catalog::fake_store::FakeStoreApi;
use catalog_browser::catalog::fixture::FixtureFile;
use catalog_browser::catalog::ProductSource;
use catalog_browser::config::{self, Config};
use catalog_browser::engine::controller::{ControllerEvent, ListController, ListSettings};
use catalog_browser::pipeline;
use catalog_browser::tui::{self, state::AppState};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("catalog-browser.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_browser=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = load_config()?;

    let source: Arc<dyn ProductSource> = match &config.source.fixture {
        Some(path) => Arc::new(FixtureFile::new(path)),
        None => Arc::new(FakeStoreApi::new(
            &config.source.base_url,
            config.source.request_timeout(),
        )?),
    };

    println!();
    println!("  Catalog Browser v0.1.0");
    println!("  Source: {}", source.describe());
    println!();

    let (state_tx, _) = watch::channel(AppState::new(source.describe()));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let loading_tx = state_tx.clone();
    let controller = ListController::new(ListSettings::from_config(&config), move |loading| {
        loading_tx.send_modify(|s| s.is_loading = loading);
    });

    let publish_tx = state_tx.clone();
    let controller_task = tokio::spawn(pipeline::run(
        controller,
        source,
        events_rx,
        events_tx.clone(),
        move |view| publish_tx.send_modify(move |s| s.set_list(view)),
    ));

    let result = tui::run_tui(state_tx, events_tx.clone()).await;

    // The TUI already asks for shutdown on quit; this covers error exits.
    let _ = events_tx.send(ControllerEvent::Shutdown);
    let _ = controller_task.await;

    tracing::debug!("shutting down");
    result
}

fn load_config() -> Result<Config> {
    // Load saved values from .env (real env vars take precedence)
    Config::load_env_file();

    let mut config = match config::config_path_from_args(std::env::args().skip(1))? {
        Some(path) => Config::load(&path)?,
        None => {
            let default_path = Path::new(config::DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(default_path)?
            } else {
                tracing::warn!("no {} found, using defaults", config::DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    };
    config.apply_env_overrides();
    Ok(config)
}
