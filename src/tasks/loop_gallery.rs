use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::LoopGalleryConfig;
use crate::gallery::{GalleryContext, label_for};
use crate::tasks::frames::{FrameClock, frame_ticker};

/// Wrap-around playback that never ends on its own.
#[derive(Debug, Clone)]
pub struct LoopState {
    len: usize,
    current_index: usize,
    running: bool,
    clock: FrameClock,
}

impl LoopState {
    /// Starts running at `now`; `None` for an empty sequence.
    pub fn new(len: usize, interval: Duration, now: Instant) -> Option<Self> {
        (len > 0).then(|| Self {
            len,
            current_index: 0,
            running: true,
            clock: FrameClock::new(interval, now),
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Returns the index to display when this frame advances the show.
    pub fn on_frame(&mut self, now: Instant) -> Option<usize> {
        if !self.running || !self.clock.tick(now) {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.len;
        Some(self.current_index)
    }
}

#[instrument(skip_all, fields(prefix = %cfg.prefix))]
pub async fn run(
    cfg: LoopGalleryConfig,
    frame_period: Duration,
    ctx: GalleryContext,
    cancel: CancellationToken,
) -> Result<()> {
    let sequence = select! {
        _ = cancel.cancelled() => return Ok(()),
        sequence = ctx.discover(&cfg.prefix) => sequence,
    };

    let mut loads = JoinSet::new();
    let mut ticker = frame_ticker(frame_period);
    let Some(mut state) = LoopState::new(sequence.len(), cfg.interval, Instant::now()) else {
        info!("no images discovered; loop gallery idle");
        cancel.cancelled().await;
        return Ok(());
    };
    info!(images = sequence.len(), interval = ?cfg.interval, "loop gallery started");
    ctx.display_detached(&mut loads, &sequence[0], label_for(&cfg.label, 0));

    loop {
        select! {
            _ = cancel.cancelled() => {
                state.stop();
                break;
            }
            now = ticker.tick() => {
                if let Some(index) = state.on_frame(now) {
                    ctx.display_detached(&mut loads, &sequence[index], label_for(&cfg.label, index));
                }
            }
            Some(_) = loads.join_next() => {}
        }
    }
    debug!(index = state.current_index(), "loop gallery stopped");
    Ok(())
}
