use crate::catalog::ProductSource;
use crate::engine::controller::{ControllerEvent, Effect, ListController, ListView};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Carries out controller effects on the tokio runtime. Every completed fetch
/// and every fired timer comes back as a `ControllerEvent`, so all state
/// transitions happen on the task that owns the controller.
pub struct Pipeline {
    source: Arc<dyn ProductSource>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    /// At most one outstanding debounce timer.
    debounce: Option<JoinHandle<()>>,
    retries: Vec<JoinHandle<()>>,
    background: Vec<JoinHandle<()>>,
}

impl Pipeline {
    pub fn new(source: Arc<dyn ProductSource>, events_tx: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        Self {
            source,
            events_tx,
            debounce: None,
            retries: Vec::new(),
            background: Vec::new(),
        }
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        self.retries.retain(|h| !h.is_finished());
        self.background.retain(|h| !h.is_finished());

        for effect in effects {
            match effect {
                Effect::Fetch { attempt } => {
                    let source = self.source.clone();
                    let tx = self.events_tx.clone();
                    self.background.push(tokio::spawn(async move {
                        let result = source.fetch_products().await;
                        let _ = tx.send(ControllerEvent::FetchCompleted { attempt, result });
                    }));
                }
                Effect::ScheduleRetry { attempt, delay } => {
                    let handle = self.send_after(delay, ControllerEvent::AutoRetry { attempt });
                    self.retries.push(handle);
                }
                Effect::CancelRetries => {
                    if !self.retries.is_empty() {
                        tracing::debug!(count = self.retries.len(), "cancelling pending retries");
                    }
                    for handle in self.retries.drain(..) {
                        handle.abort();
                    }
                }
                Effect::ScheduleDebounce { generation, delay } => {
                    if let Some(previous) = self.debounce.take() {
                        previous.abort();
                    }
                    let handle = self.send_after(delay, ControllerEvent::DebounceElapsed { generation });
                    self.debounce = Some(handle);
                }
                Effect::SchedulePageAdvance { ticket, delay } => {
                    let handle = self.send_after(delay, ControllerEvent::PageAdvance(ticket));
                    self.background.push(handle);
                }
            }
        }
    }

    #[cfg(test)]
    fn pending_retries(&self) -> usize {
        self.retries.iter().filter(|h| !h.is_finished()).count()
    }

    fn send_after(&self, delay: Duration, event: ControllerEvent) -> JoinHandle<()> {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        })
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
        for handle in self.retries.drain(..).chain(self.background.drain(..)) {
            handle.abort();
        }
    }
}

/// Drive `controller` until a `Shutdown` event arrives, publishing a fresh
/// view after every transition.
pub async fn run(
    mut controller: ListController,
    source: Arc<dyn ProductSource>,
    mut events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    mut publish: impl FnMut(ListView) + Send + 'static,
) {
    tracing::info!(source = source.describe().as_str(), "list controller started");
    let mut pipeline = Pipeline::new(source, events_tx);

    let effects = controller.start();
    pipeline.apply(effects);
    publish(controller.view());

    while let Some(event) = events_rx.recv().await {
        if matches!(event, ControllerEvent::Shutdown) {
            break;
        }
        let effects = controller.handle(event);
        pipeline.apply(effects);
        publish(controller.view());
    }

    tracing::debug!("list controller stopped");
}
