pub mod render;
pub mod state;

use crate::engine::controller::ControllerEvent;
use crate::engine::proximity::Viewport;
use crate::engine::retry::RetryAction;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::AppState;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// What a key press asks of the rest of the app.
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    /// The raw search text changed.
    Search(String),
    Retry(RetryAction),
    Quit,
}

/// Run the TUI until the user quits. Page state lives in `state_tx`; search
/// text, retries and viewport changes are forwarded on `events_tx`.
pub async fn run_tui(
    state_tx: watch::Sender<AppState>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, &state_tx, &events_tx).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_tx: &watch::Sender<AppState>,
    events_tx: &mpsc::UnboundedSender<ControllerEvent>,
) -> Result<()> {
    let mut state_rx = state_tx.subscribe();
    let mut input = EventStream::new();
    let mut spinner = tokio::time::interval(Duration::from_millis(120));
    spinner.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut spinner_frame: u8 = 0;
    let mut list_height = 0usize;
    let mut reported: Option<Viewport> = None;

    loop {
        let state = state_tx.borrow().clone();
        let mut drawn_height = None;
        terminal.draw(|f| drawn_height = render::draw(f, &state, spinner_frame))?;

        // Only a visible product table has a viewport to observe.
        if let Some(height) = drawn_height {
            list_height = height;
            let viewport = state.viewport(height);
            if reported != Some(viewport) {
                reported = Some(viewport);
                let _ = events_tx.send(ControllerEvent::Viewport(viewport));
            }
        } else {
            reported = None;
        }

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let mut action = None;
                    state_tx.send_modify(|s| action = handle_key(s, key, list_height));
                    match action {
                        Some(PageAction::Quit) => {
                            let _ = events_tx.send(ControllerEvent::Shutdown);
                            return Ok(());
                        }
                        Some(PageAction::Search(term)) => {
                            let _ = events_tx.send(ControllerEvent::SearchChanged(term));
                        }
                        Some(PageAction::Retry(retry)) => {
                            let _ = events_tx.send(ControllerEvent::Retry(retry));
                        }
                        None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            _ = state_rx.changed() => {}
            _ = spinner.tick() => {
                spinner_frame = spinner_frame.wrapping_add(1);
            }
        }
    }
}

/// Apply a key press to the page state.
pub fn handle_key(state: &mut AppState, key: KeyEvent, list_height: usize) -> Option<PageAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = list_height.max(1) as isize;
    match key.code {
        KeyCode::Char('c') if ctrl => Some(PageAction::Quit),
        KeyCode::Char('r') if ctrl => retry_action(state),
        KeyCode::F(5) => retry_action(state),
        KeyCode::Char('u') if ctrl => clear_search(state),
        KeyCode::Esc => {
            if state.search_term.is_empty() {
                Some(PageAction::Quit)
            } else {
                clear_search(state)
            }
        }
        KeyCode::Backspace => {
            state.search_term.pop()?;
            Some(PageAction::Search(state.search_term.clone()))
        }
        KeyCode::Char(c) if !ctrl => {
            state.search_term.push(c);
            Some(PageAction::Search(state.search_term.clone()))
        }
        KeyCode::Up => {
            state.move_by(-1, list_height);
            None
        }
        KeyCode::Down => {
            state.move_by(1, list_height);
            None
        }
        KeyCode::PageUp => {
            state.move_by(-page, list_height);
            None
        }
        KeyCode::PageDown => {
            state.move_by(page, list_height);
            None
        }
        KeyCode::Home => {
            state.select(0, list_height);
            None
        }
        KeyCode::End => {
            state.select(usize::MAX, list_height);
            None
        }
        _ => None,
    }
}

fn retry_action(state: &AppState) -> Option<PageAction> {
    state.list.error.as_ref().map(|e| PageAction::Retry(e.retry))
}

fn clear_search(state: &mut AppState) -> Option<PageAction> {
    if state.search_term.is_empty() {
        return None;
    }
    state.search_term.clear();
    Some(PageAction::Search(String::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::Product;
    use crate::engine::controller::{LoadError, ListView, LOAD_FAILED_MESSAGE};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn with_products(n: u64) -> AppState {
        let mut state = AppState::new(String::new());
        state.set_list(ListView {
            products: (1..=n).map(|i| Product::new(i, "t", "d", "c")).collect(),
            ..ListView::default()
        });
        state
    }

    #[test]
    fn test_typing_forwards_raw_search_text() {
        let mut state = AppState::new(String::new());
        assert_eq!(
            handle_key(&mut state, key(KeyCode::Char('s')), 10),
            Some(PageAction::Search("s".to_string()))
        );
        assert_eq!(
            handle_key(&mut state, key(KeyCode::Char('h')), 10),
            Some(PageAction::Search("sh".to_string()))
        );
        assert_eq!(
            handle_key(&mut state, key(KeyCode::Backspace), 10),
            Some(PageAction::Search("s".to_string()))
        );
        assert_eq!(state.search_term, "s");
    }

    #[test]
    fn test_backspace_on_empty_does_nothing() {
        let mut state = AppState::new(String::new());
        assert_eq!(handle_key(&mut state, key(KeyCode::Backspace), 10), None);
    }

    #[test]
    fn test_escape_clears_then_quits() {
        let mut state = AppState::new(String::new());
        state.search_term = "bag".to_string();
        assert_eq!(
            handle_key(&mut state, key(KeyCode::Esc), 10),
            Some(PageAction::Search(String::new()))
        );
        assert_eq!(handle_key(&mut state, key(KeyCode::Esc), 10), Some(PageAction::Quit));
        assert_eq!(handle_key(&mut state, ctrl('c'), 10), Some(PageAction::Quit));
    }

    #[test]
    fn test_ctrl_u_clears_search() {
        let mut state = AppState::new(String::new());
        state.search_term = "ring".to_string();
        assert_eq!(
            handle_key(&mut state, ctrl('u'), 10),
            Some(PageAction::Search(String::new()))
        );
        assert_eq!(handle_key(&mut state, ctrl('u'), 10), None);
    }

    #[test]
    fn test_retry_only_with_error() {
        let mut state = AppState::new(String::new());
        assert_eq!(handle_key(&mut state, ctrl('r'), 10), None);

        state.list.error = Some(LoadError {
            message: LOAD_FAILED_MESSAGE.to_string(),
            retry: RetryAction { attempt: 4 },
        });
        assert_eq!(
            handle_key(&mut state, ctrl('r'), 10),
            Some(PageAction::Retry(RetryAction { attempt: 4 }))
        );
        assert_eq!(
            handle_key(&mut state, key(KeyCode::F(5)), 10),
            Some(PageAction::Retry(RetryAction { attempt: 4 }))
        );
        // Ctrl+R must not leak into the search box.
        assert!(state.search_term.is_empty());
    }

    #[test]
    fn test_navigation_keys_scroll() {
        let mut state = with_products(18);
        handle_key(&mut state, key(KeyCode::PageDown), 5);
        assert_eq!(state.selected, 5);
        assert_eq!(state.scroll_offset, 1);
        handle_key(&mut state, key(KeyCode::End), 5);
        assert_eq!(state.selected, 17);
        assert_eq!(state.scroll_offset, 13);
        handle_key(&mut state, key(KeyCode::Up), 5);
        assert_eq!(state.selected, 16);
        handle_key(&mut state, key(KeyCode::Home), 5);
        assert_eq!((state.selected, state.scroll_offset), (0, 0));
    }
}
