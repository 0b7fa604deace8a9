use crate::engine::controller::ListView;
use crate::engine::proximity::Viewport;
use std::time::Instant;

/// Root view state: the raw search text, the global loading indicator and
/// the latest list view published by the controller.
#[derive(Debug, Clone)]
pub struct AppState {
    /// What the user typed, before debouncing.
    pub search_term: String,
    /// Set only through the controller's loading callback.
    pub is_loading: bool,
    pub list: ListView,
    pub selected: usize,
    pub scroll_offset: usize,
    pub source_label: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(source_label: String) -> Self {
        Self {
            search_term: String::new(),
            is_loading: false,
            list: ListView::initial(),
            selected: 0,
            scroll_offset: 0,
            source_label,
            start_time: Instant::now(),
        }
    }

    /// Take a new view from the controller, keeping the cursor in range.
    /// A different filter term sends the cursor back to the top.
    pub fn set_list(&mut self, view: ListView) {
        if view.term != self.list.term {
            self.selected = 0;
            self.scroll_offset = 0;
        }
        self.list = view;
        let len = self.list.products.len();
        self.selected = self.selected.min(len.saturating_sub(1));
        self.scroll_offset = self.scroll_offset.min(self.selected);
    }

    /// Move the cursor to `index` and scroll so it stays within `height` rows.
    pub fn select(&mut self, index: usize, height: usize) {
        let len = self.list.products.len();
        if len == 0 {
            self.selected = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected = index.min(len - 1);
        let height = height.max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    pub fn move_by(&mut self, delta: isize, height: usize) {
        let target = if delta < 0 {
            self.selected.saturating_sub(delta.unsigned_abs())
        } else {
            self.selected.saturating_add(delta as usize)
        };
        self.select(target, height);
    }

    pub fn viewport(&self, height: usize) -> Viewport {
        Viewport::new(self.scroll_offset, height)
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let m = secs / 60;
        let s = secs % 60;
        format!("{}m {:02}s", m, s)
    }
}
