//! Timing parameters for polling and preview refresh.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingParams {
    /// Interval between consensus polls
    pub poll_interval: Duration,
    /// Upper bound for one poll request
    pub tick_timeout: Duration,
    /// Quiet period before a burst of artifact writes refreshes the preview
    pub preview_debounce: Duration,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            tick_timeout: Duration::from_millis(10_000),
            preview_debounce: Duration::from_millis(300),
        }
    }
}

impl TimingParams {
    // ==================== Builder Methods ====================

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_tick_timeout(mut self, timeout: Duration) -> Self {
        self.tick_timeout = timeout;
        self
    }

    pub fn with_preview_debounce(mut self, debounce: Duration) -> Self {
        self.preview_debounce = debounce;
        self
    }
}
