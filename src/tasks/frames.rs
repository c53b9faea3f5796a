use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval};

/// Elapsed-time gate shared by the timed galleries.
///
/// A frame advances once at least `interval` has passed since the previous
/// advance; the clock then restarts at the frame's timestamp.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    last: Instant,
}

impl FrameClock {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: now,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Frame sampler for a gallery task. Late frames are skipped, not bunched.
pub fn frame_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
