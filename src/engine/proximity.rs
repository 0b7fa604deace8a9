/// The visible window of the product list, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Index of the first visible row.
    pub first: usize,
    /// Number of rows that fit on screen.
    pub height: usize,
}

impl Viewport {
    pub fn new(first: usize, height: usize) -> Self {
        Self { first, height }
    }

    /// Whether `row` lies inside the viewport grown by `margin` rows on both ends.
    pub fn contains_with_margin(&self, row: usize, margin: usize) -> bool {
        let start = self.first.saturating_sub(margin);
        let end = self.first + self.height + margin;
        self.height > 0 && row >= start && row < end
    }
}

/// Observes one target row and signals when it comes near the viewport.
///
/// There is at most one observation at a time. `attach` tears down the
/// previous one; a torn-down observer never signals. Each attachment signals
/// on the edge from "not near" to "near", including the very first
/// evaluation, so a target that is already on screen when attached signals
/// once and then stays quiet until it leaves and comes back.
#[derive(Debug, Clone)]
pub struct ProximityObserver {
    margin: usize,
    target: Option<usize>,
    was_near: bool,
}

impl ProximityObserver {
    pub fn new(margin: usize) -> Self {
        Self {
            margin,
            target: None,
            was_near: false,
        }
    }

    /// Start observing `row`, evaluating immediately against `viewport` if known.
    pub fn attach(&mut self, row: usize, viewport: Option<Viewport>) -> bool {
        self.teardown();
        self.target = Some(row);
        match viewport {
            Some(vp) => self.update(vp),
            None => false,
        }
    }

    pub fn teardown(&mut self) {
        self.target = None;
        self.was_near = false;
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Feed a new viewport. Returns true when this update is a proximity signal.
    pub fn update(&mut self, viewport: Viewport) -> bool {
        let Some(row) = self.target else {
            return false;
        };
        let near = viewport.contains_with_margin(row, self.margin);
        let signal = near && !self.was_near;
        self.was_near = near;
        signal
    }
}
