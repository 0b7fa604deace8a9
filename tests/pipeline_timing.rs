//! Timer behaviour of the running pipeline, on tokio's paused clock.

use anyhow::Result;
use async_trait::async_trait;
use catalog_browser::catalog::types::Product;
use catalog_browser::catalog::ProductSource;
use catalog_browser::engine::controller::{ControllerEvent, ListController, ListSettings, ListView};
use catalog_browser::engine::proximity::Viewport;
use catalog_browser::pipeline;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Answers fetches from a script of outcomes; the last outcome repeats.
struct ScriptedSource {
    outcomes: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.iter().copied().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductSource for ScriptedSource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ok = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap_or(false)
            } else {
                outcomes.front().copied().unwrap_or(false)
            }
        };
        if ok {
            Ok(catalog())
        } else {
            anyhow::bail!("GET products failed (503 Service Unavailable)")
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

fn catalog() -> Vec<Product> {
    (1..=20)
        .map(|i| match i {
            4 => Product::new(i, "Casual Slim Fit Shirt", "cotton blend", "men's clothing"),
            15 => Product::new(i, "Short Sleeve Moisture Shirt", "breathable", "women's clothing"),
            _ => Product::new(i, &format!("Product {}", i), "sample item", "misc"),
        })
        .collect()
}

struct Harness {
    events: mpsc::UnboundedSender<ControllerEvent>,
    views: watch::Receiver<ListView>,
    terms: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl Harness {
    fn spawn(source: Arc<ScriptedSource>, settings: ListSettings) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (view_tx, views) = watch::channel(ListView::initial());
        let terms = Arc::new(Mutex::new(Vec::new()));
        let seen = terms.clone();

        let controller = ListController::new(settings, |_| {});
        let task = tokio::spawn(pipeline::run(
            controller,
            source,
            events_rx,
            events.clone(),
            move |view: ListView| {
                seen.lock().unwrap().push(view.term.clone());
                let _ = view_tx.send(view);
            },
        ));
        Self { events, views, terms, task }
    }

    fn send(&self, event: ControllerEvent) {
        self.events.send(event).unwrap();
    }

    async fn wait_for(&mut self, f: impl FnMut(&ListView) -> bool) -> ListView {
        self.views.wait_for(f).await.unwrap().clone()
    }

    async fn shutdown(self) {
        self.send(ControllerEvent::Shutdown);
        self.task.await.unwrap();
    }
}

fn ready(view: &ListView) -> bool {
    !view.loading && view.total_len == 20
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_shows_first_page() {
    let source = ScriptedSource::new(&[true]);
    let mut h = Harness::spawn(source.clone(), ListSettings::default());

    let view = h.wait_for(ready).await;
    assert_eq!(view.products.len(), 6);
    assert!(view.has_more);
    assert_eq!(source.calls(), 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_propagates_only_last_term() {
    let source = ScriptedSource::new(&[true]);
    let mut h = Harness::spawn(source, ListSettings::default());
    h.wait_for(ready).await;

    h.send(ControllerEvent::SearchChanged("s".to_string()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.send(ControllerEvent::SearchChanged("sh".to_string()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.send(ControllerEvent::SearchChanged("shirt".to_string()));
    let last_input = Instant::now();

    let view = h.wait_for(|v| v.term == "shirt").await;
    let waited = last_input.elapsed();
    assert!(waited >= Duration::from_millis(300), "settled after {:?}", waited);
    assert!(waited < Duration::from_millis(400), "settled after {:?}", waited);
    assert_eq!(view.filtered_len, 2);
    assert!(!view.has_more);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let mut committed = h.terms.lock().unwrap().clone();
    committed.dedup();
    assert_eq!(committed, vec!["".to_string(), "shirt".to_string()]);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_four_failures_then_manual_retry() {
    let source = ScriptedSource::new(&[false]);
    let mut h = Harness::spawn(source.clone(), ListSettings::default());
    let started = Instant::now();

    let view = h
        .wait_for(|v| !v.loading && v.error.as_ref().map(|e| e.retry.attempt) == Some(4))
        .await;
    assert_eq!(source.calls(), 4);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7), "{:?}", elapsed);

    // No further automatic attempts.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.calls(), 4);

    let retry = view.error.unwrap().retry;
    h.send(ControllerEvent::Retry(retry));
    h.wait_for(|v| !v.loading && v.error.as_ref().map(|e| e.retry.attempt) == Some(5))
        .await;
    assert_eq!(source.calls(), 5);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recovers_on_auto_retry() {
    let source = ScriptedSource::new(&[false, false, true]);
    let mut h = Harness::spawn(source.clone(), ListSettings::default());
    let started = Instant::now();

    let view = h.wait_for(ready).await;
    assert!(view.error.is_none());
    assert_eq!(source.calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(4));
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_proximity_advances_after_delay() {
    let source = ScriptedSource::new(&[true]);
    let mut h = Harness::spawn(source, ListSettings::default());
    h.wait_for(ready).await;

    h.send(ControllerEvent::Viewport(Viewport::new(0, 4)));
    let signalled = Instant::now();
    let view = h.wait_for(|v| v.pages == 2).await;
    let waited = signalled.elapsed();
    assert!(waited >= Duration::from_millis(1500), "advanced after {:?}", waited);
    assert!(waited < Duration::from_millis(1600), "advanced after {:?}", waited);
    assert_eq!(view.products.len(), 12);

    // The new last row is off screen, so nothing else happens.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.views.borrow().pages, 2);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_search_during_page_delay_stays_on_first_page() {
    let source = ScriptedSource::new(&[true]);
    let mut h = Harness::spawn(source, ListSettings::default());
    h.wait_for(ready).await;

    h.send(ControllerEvent::Viewport(Viewport::new(0, 4)));
    tokio::time::sleep(Duration::from_millis(500)).await;
    h.send(ControllerEvent::SearchChanged("product".to_string()));
    h.wait_for(|v| v.term == "product").await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    let view = h.views.borrow().clone();
    assert_eq!(view.pages, 1);
    assert_eq!(view.products.len(), 6);
    assert_eq!(view.filtered_len, 18);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_retry_still_fires_after_manual_success() {
    let source = ScriptedSource::new(&[false, true]);
    let mut h = Harness::spawn(source.clone(), ListSettings::default());

    let view = h.wait_for(|v| v.error.is_some()).await;
    h.send(ControllerEvent::Retry(view.error.unwrap().retry));
    h.wait_for(ready).await;
    assert_eq!(source.calls(), 2);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.calls(), 3);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_cancel_on_success_stops_stale_retry() {
    let source = ScriptedSource::new(&[false, true]);
    let mut settings = ListSettings::default();
    settings.retry.cancel_on_success = true;
    let mut h = Harness::spawn(source.clone(), settings);

    let view = h.wait_for(|v| v.error.is_some()).await;
    h.send(ControllerEvent::Retry(view.error.unwrap().retry));
    h.wait_for(ready).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(source.calls(), 2);
    h.shutdown().await;
}
