//! Per-frame timing.

use instant::Instant;

/// `deltaTime`/`lastFrame` bookkeeping, in seconds since the clock started.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    start: Instant,
    last_frame: f32,
    delta_time: f32,
}

impl FrameTiming {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_frame: 0.0,
            delta_time: 0.0,
        }
    }

    /// Records a frame at `now` seconds and returns the time since the previous one.
    pub fn advance(&mut self, now: f32) -> f32 {
        self.delta_time = now - self.last_frame;
        self.last_frame = now;
        self.delta_time
    }

    /// Advances using the monotonic clock.
    pub fn tick(&mut self) -> f32 {
        let now = self.start.elapsed().as_secs_f32();
        self.advance(now)
    }
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}
