use std::time::{Duration, Instant};
use tracing::trace;

/// Default frame budget (~60Hz)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Coalesces scroll offsets to at most one window recomputation per frame.
///
/// The first offset after an idle period schedules a tick; later offsets
/// only overwrite the pending value. When the tick fires, the most recent
/// offset is handed out and everything in between is dropped.
#[derive(Debug, Clone)]
pub struct ScrollThrottler {
    /// Frame budget used by [`ScrollThrottler::poll`]
    frame_interval: Duration,
    /// Latest offset seen since the last tick
    pending_offset: Option<f64>,
    /// When the pending tick was scheduled
    scheduled_at: Option<Instant>,
    /// Offsets absorbed without a recomputation, for diagnostics
    coalesced: u64,
}

impl Default for ScrollThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

impl ScrollThrottler {
    pub fn new(frame_interval_ms: u64) -> Self {
        Self {
            frame_interval: Duration::from_millis(frame_interval_ms),
            pending_offset: None,
            scheduled_at: None,
            coalesced: 0,
        }
    }

    /// Record a new scroll offset.
    ///
    /// Returns true when this call scheduled a frame tick, false when a tick
    /// was already pending and the offset was merged into it.
    pub fn push(&mut self, offset: f64, now: Instant) -> bool {
        let scheduled = self.scheduled_at.is_none();
        if scheduled {
            self.scheduled_at = Some(now);
        } else {
            self.coalesced += 1;
        }
        self.pending_offset = Some(offset);
        scheduled
    }

    /// Fire the tick if a frame interval has passed since it was scheduled
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let scheduled_at = self.scheduled_at?;
        if now.saturating_duration_since(scheduled_at) >= self.frame_interval {
            self.on_frame()
        } else {
            None
        }
    }

    /// Fire the tick now, for hosts that drive their own frame clock
    pub fn on_frame(&mut self) -> Option<f64> {
        self.scheduled_at = None;
        let offset = self.pending_offset.take();
        if let Some(offset) = offset {
            trace!(target: "scroll", "Frame tick applies offset {}", offset);
        }
        offset
    }

    /// Revoke the pending tick without applying it
    pub fn cancel(&mut self) -> bool {
        let had_pending = self.scheduled_at.is_some();
        self.scheduled_at = None;
        self.pending_offset = None;
        had_pending
    }

    pub fn is_pending(&self) -> bool {
        self.scheduled_at.is_some()
    }

    /// Time until [`ScrollThrottler::poll`] would fire, None if idle
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.scheduled_at.map(|scheduled_at| {
            let elapsed = now.saturating_duration_since(scheduled_at);
            self.frame_interval.saturating_sub(elapsed)
        })
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
