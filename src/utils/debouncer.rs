use std::time::{Duration, Instant};
use tracing::trace;

/// Default quiescence window for text filters
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// A simple debouncer that tracks when an action should be triggered
/// after a period of inactivity.
///
/// Time is passed in by the caller so the owner decides what "now" is.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// The duration to wait after the last event before triggering
    delay: Duration,
    /// When the last event occurred
    last_event: Option<Instant>,
    /// Whether we have a pending trigger
    pending: bool,
}

impl Debouncer {
    /// Create a new debouncer with the specified delay in milliseconds
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_event: None,
            pending: false,
        }
    }

    /// Register that an event occurred; restarts the quiet period
    pub fn trigger(&mut self, now: Instant) {
        self.last_event = Some(now);
        self.pending = true;
    }

    /// Check if enough time has passed to execute the debounced action.
    /// Returns true exactly once per quiet period.
    pub fn should_execute(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }

        if let Some(last) = self.last_event {
            if now.saturating_duration_since(last) >= self.delay {
                self.pending = false;
                self.last_event = None;
                return true;
            }
        }
        false
    }

    /// Get the time remaining before the action will trigger
    /// Returns None if no action is pending
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        if !self.pending {
            return None;
        }

        self.last_event
            .map(|last| self.delay.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Reset the debouncer, canceling any pending action
    pub fn reset(&mut self) {
        self.last_event = None;
        self.pending = false;
    }

    /// Check if there's a pending action
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Trailing-edge coalescer for a stream of input values.
///
/// Every new value restarts the quiet period; once it elapses the last
/// value is committed. Values that were overwritten before the window
/// closed are never committed.
#[derive(Debug, Clone)]
pub struct InputCoalescer<T> {
    debouncer: Debouncer,
    latest: Option<T>,
}

impl<T: Clone> InputCoalescer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            debouncer: Debouncer::new(delay_ms),
            latest: None,
        }
    }

    /// Feed a raw input value
    pub fn input(&mut self, value: T, now: Instant) {
        self.latest = Some(value);
        self.debouncer.trigger(now);
        trace!(target: "debounce", "Input received, commit in {:?}", self.debouncer.delay());
    }

    /// Commit the latest value if the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.debouncer.should_execute(now) {
            self.latest.take()
        } else {
            None
        }
    }

    /// Commit the latest value immediately (e.g. on Enter)
    pub fn flush(&mut self) -> Option<T> {
        self.debouncer.reset();
        self.latest.take()
    }

    /// Drop the pending value without committing it
    pub fn cancel(&mut self) -> bool {
        let had_pending = self.debouncer.is_pending();
        self.debouncer.reset();
        self.latest = None;
        had_pending
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Value waiting to be committed
    pub fn pending_value(&self) -> Option<&T> {
        self.latest.as_ref()
    }

    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_remaining(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debouncer_fires_once_after_quiet_period() {
        let mut debouncer = Debouncer::new(300);
        let t0 = Instant::now();

        assert!(!debouncer.should_execute(t0));
        debouncer.trigger(t0);
        assert!(debouncer.is_pending());
        assert!(!debouncer.should_execute(t0 + ms(299)));
        assert!(debouncer.should_execute(t0 + ms(300)));
        assert!(!debouncer.should_execute(t0 + ms(900)));
    }

    #[test]
    fn test_retrigger_restarts_window() {
        let mut debouncer = Debouncer::new(300);
        let t0 = Instant::now();

        debouncer.trigger(t0);
        debouncer.trigger(t0 + ms(200));
        assert!(!debouncer.should_execute(t0 + ms(400)));
        assert_eq!(debouncer.time_remaining(t0 + ms(400)), Some(ms(100)));
        assert!(debouncer.should_execute(t0 + ms(500)));
        assert_eq!(debouncer.time_remaining(t0 + ms(500)), None);
    }

    #[test]
    fn test_burst_commits_only_last_value() {
        let mut coalescer = InputCoalescer::new(300);
        let t0 = Instant::now();

        let typed = ["T", "Te", "Tec", "Tech"];
        for (i, value) in typed.iter().enumerate() {
            coalescer.input(value.to_string(), t0 + ms(50 * i as u64));
            assert_eq!(coalescer.poll(t0 + ms(50 * i as u64 + 10)), None);
        }

        assert_eq!(coalescer.poll(t0 + ms(449)), None);
        assert_eq!(coalescer.poll(t0 + ms(450)), Some("Tech".to_string()));
        assert_eq!(coalescer.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_separate_bursts_commit_in_order() {
        let mut coalescer = InputCoalescer::new(300);
        let t0 = Instant::now();
        let mut commits = Vec::new();

        coalescer.input("Fin", t0);
        if let Some(v) = coalescer.poll(t0 + ms(300)) {
            commits.push(v);
        }
        coalescer.input("FinB", t0 + ms(400));
        if let Some(v) = coalescer.poll(t0 + ms(700)) {
            commits.push(v);
        }

        assert_eq!(commits, vec!["Fin", "FinB"]);
    }

    #[test]
    fn test_cancel_never_commits() {
        let mut coalescer = InputCoalescer::new(300);
        let t0 = Instant::now();

        coalescer.input(1u32, t0);
        assert!(coalescer.cancel());
        assert_eq!(coalescer.poll(t0 + ms(1000)), None);
        assert!(!coalescer.cancel());
    }

    #[test]
    fn test_flush_commits_immediately() {
        let mut coalescer = InputCoalescer::new(300);
        let t0 = Instant::now();

        coalescer.input("Cloud", t0);
        assert_eq!(coalescer.pending_value(), Some(&"Cloud"));
        assert_eq!(coalescer.flush(), Some("Cloud"));
        assert!(!coalescer.is_pending());
        assert_eq!(coalescer.poll(t0 + ms(300)), None);
    }
}
