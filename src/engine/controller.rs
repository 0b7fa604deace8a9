use super::debounce::Debounced;
use super::filter::{filter_indices, filter_products};
use super::paginate;
use super::proximity::{ProximityObserver, Viewport};
use super::retry::{RetryAction, RetryPolicy};
use crate::catalog::types::Product;
use crate::config::Config;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;

pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load products. Please check your internet connection.";

/// Tunables for the list controller, resolved from config.
#[derive(Debug, Clone)]
pub struct ListSettings {
    pub page_size: usize,
    pub search_debounce: Duration,
    pub page_advance_delay: Duration,
    pub proximity_margin: usize,
    pub retry: RetryPolicy,
}

impl ListSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.list.page_size.max(1),
            search_debounce: config.list.search_debounce(),
            page_advance_delay: config.list.page_advance_delay(),
            proximity_margin: config.list.proximity_margin_rows,
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

impl Default for ListSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A failed load as the UI sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadError {
    pub message: String,
    pub retry: RetryAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Error(LoadError),
}

/// Page-advance token, stamped with the filter epoch it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    epoch: u64,
}

/// Work the controller asks its runtime to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { attempt: u32 },
    ScheduleRetry { attempt: u32, delay: Duration },
    /// Abort every pending automatic retry timer.
    CancelRetries,
    /// Replaces any debounce timer still pending.
    ScheduleDebounce { generation: u64, delay: Duration },
    SchedulePageAdvance { ticket: AdvanceTicket, delay: Duration },
}

/// Inputs to the controller: user actions, completed fetches and fired timers.
#[derive(Debug)]
pub enum ControllerEvent {
    SearchChanged(String),
    DebounceElapsed { generation: u64 },
    FetchCompleted {
        attempt: u32,
        result: anyhow::Result<Vec<Product>>,
    },
    AutoRetry { attempt: u32 },
    Retry(RetryAction),
    Viewport(Viewport),
    PageAdvance(AdvanceTicket),
    Shutdown,
}

/// Immutable inputs from which the filtered and displayed sets are derived.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub products: Arc<[Product]>,
    pub term: String,
    pub pages: usize,
}

impl Snapshot {
    pub fn filtered(&self) -> Vec<&Product> {
        filter_products(&self.products, &self.term)
    }

    pub fn displayed(&self, page_size: usize) -> Vec<&Product> {
        let filtered = self.filtered();
        paginate::page_prefix(&filtered, self.pages, page_size).to_vec()
    }
}

/// Everything the host needs to render the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<LoadError>,
    pub has_more: bool,
    pub filtered_len: usize,
    pub total_len: usize,
    /// The debounced term the filtered set was computed from.
    pub term: String,
    pub pages: usize,
    pub loaded_at: Option<DateTime<Local>>,
}

impl ListView {
    /// What the host shows before the controller has published anything.
    pub fn initial() -> Self {
        Self {
            loading: true,
            pages: 1,
            ..Self::default()
        }
    }

    /// No matches for a non-empty search.
    pub fn is_empty_search(&self) -> bool {
        self.filtered_len == 0 && !self.term.is_empty()
    }
}

type LoadingListener = Box<dyn FnMut(bool) + Send>;

/// Owns the product set and derives the filtered and paginated views.
///
/// Pure with respect to time and I/O: every operation returns the effects
/// the runtime must perform. The only outbound call is the loading listener,
/// invoked whenever the loading flag flips.
pub struct ListController {
    settings: ListSettings,
    phase: LoadPhase,
    products: Arc<[Product]>,
    loaded_at: Option<DateTime<Local>>,
    search: Debounced<String>,
    filtered: Vec<usize>,
    pages: usize,
    epoch: u64,
    observer: ProximityObserver,
    observed: Option<(usize, bool, bool)>,
    viewport: Option<Viewport>,
    reported_loading: Option<bool>,
    on_loading_change: LoadingListener,
}

impl ListController {
    pub fn new(settings: ListSettings, on_loading_change: impl FnMut(bool) + Send + 'static) -> Self {
        let observer = ProximityObserver::new(settings.proximity_margin);
        Self {
            settings,
            phase: LoadPhase::Loading,
            products: Arc::from(Vec::new()),
            loaded_at: None,
            search: Debounced::new(String::new()),
            filtered: Vec::new(),
            pages: 1,
            epoch: 0,
            observer,
            observed: None,
            viewport: None,
            reported_loading: None,
            on_loading_change: Box::new(on_loading_change),
        }
    }

    /// First activation: begin the initial load.
    pub fn start(&mut self) -> Vec<Effect> {
        let effects = self.begin_load(0);
        self.finish(effects)
    }

    pub fn handle(&mut self, event: ControllerEvent) -> Vec<Effect> {
        match event {
            ControllerEvent::SearchChanged(term) => self.search_changed(term),
            ControllerEvent::DebounceElapsed { generation } => self.debounce_elapsed(generation),
            ControllerEvent::FetchCompleted { attempt, result } => self.fetch_completed(attempt, result),
            ControllerEvent::AutoRetry { attempt } => self.auto_retry(attempt),
            ControllerEvent::Retry(action) => self.retry(action),
            ControllerEvent::Viewport(viewport) => self.viewport_changed(viewport),
            ControllerEvent::PageAdvance(ticket) => self.page_advance(ticket),
            ControllerEvent::Shutdown => Vec::new(),
        }
    }

    pub fn search_changed(&mut self, term: String) -> Vec<Effect> {
        let generation = self.search.input(term);
        let effects = vec![Effect::ScheduleDebounce {
            generation,
            delay: self.settings.search_debounce,
        }];
        self.finish(effects)
    }

    pub fn debounce_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if self.search.settle(generation) {
            tracing::debug!(term = self.search.value().as_str(), "search term settled");
            self.refilter();
        }
        self.finish(Vec::new())
    }

    pub fn fetch_completed(&mut self, attempt: u32, result: anyhow::Result<Vec<Product>>) -> Vec<Effect> {
        let mut effects = Vec::new();
        match result {
            Ok(products) => {
                tracing::info!(attempt, count = products.len(), "products loaded");
                self.products = Arc::from(products);
                self.loaded_at = Some(Local::now());
                self.set_phase(LoadPhase::Ready);
                self.refilter();
                if self.settings.retry.cancel_on_success {
                    effects.push(Effect::CancelRetries);
                }
            }
            Err(e) => {
                tracing::error!(attempt, "error fetching products: {:#}", e);
                self.set_phase(LoadPhase::Error(LoadError {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                    retry: self.settings.retry.manual(attempt),
                }));
                // Scheduled regardless of any manual retry; nothing cancels it
                // unless cancel_on_success is set.
                if let Some(next) = self.settings.retry.next_auto_attempt(attempt) {
                    effects.push(Effect::ScheduleRetry {
                        attempt: next,
                        delay: self.settings.retry.delay,
                    });
                }
            }
        }
        self.finish(effects)
    }

    pub fn auto_retry(&mut self, attempt: u32) -> Vec<Effect> {
        tracing::warn!(attempt, "retrying product load");
        let effects = self.begin_load(attempt);
        self.finish(effects)
    }

    pub fn retry(&mut self, action: RetryAction) -> Vec<Effect> {
        tracing::info!(attempt = action.attempt, "manual retry requested");
        let effects = self.begin_load(action.attempt);
        self.finish(effects)
    }

    pub fn viewport_changed(&mut self, viewport: Viewport) -> Vec<Effect> {
        self.viewport = Some(viewport);
        let mut effects = Vec::new();
        if self.observer.update(viewport) {
            self.on_proximity(&mut effects);
        }
        self.finish(effects)
    }

    pub fn page_advance(&mut self, ticket: AdvanceTicket) -> Vec<Effect> {
        if ticket.epoch == self.epoch {
            self.pages += 1;
            tracing::debug!(pages = self.pages, "page advanced");
        } else {
            tracing::debug!("dropping page advance issued before a filter reset");
        }
        self.finish(Vec::new())
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn has_more(&self) -> bool {
        paginate::has_more(self.filtered.len(), self.pages, self.settings.page_size)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            products: self.products.clone(),
            term: self.search.value().clone(),
            pages: self.pages,
        }
    }

    /// Derived from `snapshot()`; `filtered` is only a cache of its filter.
    pub fn view(&self) -> ListView {
        let snapshot = self.snapshot();
        let filtered = snapshot.filtered();
        debug_assert_eq!(filtered.len(), self.filtered.len());
        let products = paginate::page_prefix(&filtered, snapshot.pages, self.settings.page_size)
            .iter()
            .map(|&p| p.clone())
            .collect();
        ListView {
            products,
            loading: self.is_loading(),
            error: match &self.phase {
                LoadPhase::Error(e) => Some(e.clone()),
                _ => None,
            },
            has_more: paginate::has_more(filtered.len(), snapshot.pages, self.settings.page_size),
            filtered_len: filtered.len(),
            total_len: snapshot.products.len(),
            term: snapshot.term,
            pages: snapshot.pages,
            loaded_at: self.loaded_at,
        }
    }

    fn displayed_len(&self) -> usize {
        paginate::displayed_len(self.filtered.len(), self.pages, self.settings.page_size)
    }

    fn begin_load(&mut self, attempt: u32) -> Vec<Effect> {
        tracing::debug!(attempt, "loading products");
        self.set_phase(LoadPhase::Loading);
        vec![Effect::Fetch { attempt }]
    }

    /// Filter inputs changed: recompute and go back to the first page.
    fn refilter(&mut self) {
        self.filtered = filter_indices(&self.products, self.search.value());
        self.pages = 1;
        self.epoch += 1;
    }

    fn set_phase(&mut self, phase: LoadPhase) {
        self.phase = phase;
        let loading = self.is_loading();
        if self.reported_loading != Some(loading) {
            self.reported_loading = Some(loading);
            (self.on_loading_change)(loading);
        }
    }

    fn on_proximity(&mut self, effects: &mut Vec<Effect>) {
        if self.is_loading() || !self.has_more() {
            return;
        }
        effects.push(Effect::SchedulePageAdvance {
            ticket: AdvanceTicket { epoch: self.epoch },
            delay: self.settings.page_advance_delay,
        });
    }

    /// Re-attach the proximity observer to the last displayed row whenever
    /// what it depends on changed. Runs after every operation.
    fn finish(&mut self, mut effects: Vec<Effect>) -> Vec<Effect> {
        let deps = (self.displayed_len(), self.is_loading(), self.has_more());
        if self.observed != Some(deps) {
            self.observed = Some(deps);
            let (shown, loading, _) = deps;
            if loading || shown == 0 {
                self.observer.teardown();
            } else if self.observer.attach(shown - 1, self.viewport) {
                self.on_proximity(&mut effects);
            }
        }
        effects
    }
}
