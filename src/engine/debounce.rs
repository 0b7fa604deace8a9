/// A value that only takes a new input once the input has been stable for a
/// quiet period.
///
/// This type does not own a timer. `input` hands back a generation that the
/// caller schedules for the quiet period; `settle` commits only if that
/// generation is still the newest, so a superseded timer that fires anyway
/// can never publish a stale value.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    committed: T,
    pending: Option<T>,
    generation: u64,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T) -> Self {
        Self {
            committed: initial,
            pending: None,
            generation: 0,
        }
    }

    /// Record a new input. Returns the generation to settle after the quiet period.
    pub fn input(&mut self, value: T) -> u64 {
        self.generation += 1;
        self.pending = Some(value);
        self.generation
    }

    /// Commit the pending value if `generation` is the latest input.
    /// Returns true only when the committed value actually changed.
    pub fn settle(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.pending.take() {
            Some(value) if value != self.committed => {
                self.committed = value;
                true
            }
            _ => false,
        }
    }

    pub fn value(&self) -> &T {
        &self.committed
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
