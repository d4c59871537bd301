use std::time::{Duration, Instant};

/// Counts frames per fixed wall-clock window. Observational only.
#[derive(Debug, Clone)]
pub struct FrameRateMeter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl Default for FrameRateMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FrameRateMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames: 0,
            fps: 0,
        }
    }

    /// Count one rendered frame
    pub fn tick(&mut self, now: Instant) {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(start) >= self.window {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
        }
    }

    /// Frames counted in the last completed window
    pub fn fps(&self) -> u32 {
        self.fps
    }
}
