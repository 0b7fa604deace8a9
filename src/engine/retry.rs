use crate::config::RetryConfig;
use std::time::Duration;

/// Handle for "reattempt load", carried by a load error. Holds the attempt
/// number the retry will run as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAction {
    pub attempt: u32,
}

/// Bounded automatic retry at a fixed interval.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_auto_retries: u32,
    pub delay: Duration,
    pub cancel_on_success: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_auto_retries: config.max_auto_retries,
            delay: config.delay(),
            cancel_on_success: config.cancel_on_success,
        }
    }

    /// Attempt to schedule after `failed_attempt` failed, if any remain.
    /// Attempt 0 is the initial load, so `max_auto_retries = 3` allows 1..=3.
    pub fn next_auto_attempt(&self, failed_attempt: u32) -> Option<u32> {
        (failed_attempt < self.max_auto_retries).then_some(failed_attempt + 1)
    }

    /// Manual retries are never bounded.
    pub fn manual(&self, failed_attempt: u32) -> RetryAction {
        RetryAction {
            attempt: failed_attempt.saturating_add(1),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
