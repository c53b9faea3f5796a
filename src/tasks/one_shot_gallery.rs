//! Gallery that plays through once each time it scrolls into view.

use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::OneShotGalleryConfig;
use crate::gallery::{GalleryContext, label_for};
use crate::tasks::frames::{FrameClock, frame_ticker};

#[derive(Debug, Clone)]
pub struct OneShotState {
    len: usize,
    current_index: usize,
    has_played_this_visit: bool,
    running: bool,
    clock: FrameClock,
}

impl OneShotState {
    pub fn new(len: usize, interval: Duration, now: Instant) -> Self {
        Self {
            len,
            current_index: 0,
            has_played_this_visit: false,
            running: false,
            clock: FrameClock::new(interval, now),
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_played_this_visit(&self) -> bool {
        self.has_played_this_visit
    }

    /// Returns `true` when this change started a play-through.
    pub fn on_visibility(&mut self, visible: bool, now: Instant) -> bool {
        if visible {
            if self.has_played_this_visit || self.len == 0 {
                return false;
            }
            self.has_played_this_visit = true;
            self.current_index = 0;
            self.running = true;
            self.clock.restart(now);
            true
        } else {
            self.running = false;
            self.has_played_this_visit = false;
            self.current_index = 0;
            false
        }
    }

    /// Returns the index to display on this frame. The run ends on the first
    /// tick after the last image.
    pub fn on_frame(&mut self, now: Instant) -> Option<usize> {
        if !self.running || !self.clock.tick(now) {
            return None;
        }
        if self.current_index < self.len {
            let shown = self.current_index;
            self.current_index += 1;
            Some(shown)
        } else {
            self.running = false;
            None
        }
    }
}

#[instrument(skip_all, fields(prefix = %cfg.prefix))]
pub async fn run(
    cfg: OneShotGalleryConfig,
    frame_period: Duration,
    ctx: GalleryContext,
    mut visibility: watch::Receiver<f32>,
    cancel: CancellationToken,
) -> Result<()> {
    let sequence = select! {
        _ = cancel.cancelled() => return Ok(()),
        sequence = ctx.discover(&cfg.prefix) => sequence,
    };
    if sequence.is_empty() {
        info!("no images discovered; one-shot gallery idle");
        cancel.cancelled().await;
        return Ok(());
    }
    info!(images = sequence.len(), "one-shot gallery ready");

    let mut loads = JoinSet::new();
    let mut ticker = frame_ticker(frame_period);
    let mut state = OneShotState::new(sequence.len(), cfg.interval, Instant::now());
    let mut observing = true;
    ctx.display_detached(&mut loads, &sequence[0], label_for(&cfg.label, 0));

    let ratio = *visibility.borrow_and_update();
    if state.on_visibility(ratio >= cfg.visibility_threshold, Instant::now()) {
        debug!(ratio, "visible at start; playing");
    }

    loop {
        select! {
            _ = cancel.cancelled() => break,

            changed = visibility.changed(), if observing => {
                if changed.is_err() {
                    debug!("visibility source closed");
                    observing = false;
                    continue;
                }
                let ratio = *visibility.borrow_and_update();
                let visible = ratio >= cfg.visibility_threshold;
                if state.on_visibility(visible, Instant::now()) {
                    debug!(ratio, "entered view; playing");
                } else if !visible {
                    debug!(ratio, "left view; reset");
                }
            }

            // after an idle stretch the first tick carries a stale deadline; on_frame saturates
            now = ticker.tick(), if state.is_running() => {
                if let Some(index) = state.on_frame(now) {
                    ctx.display_detached(&mut loads, &sequence[index], label_for(&cfg.label, index));
                } else if !state.is_running() {
                    debug!(shown = state.current_index(), "play-through finished");
                }
            }

            Some(_) = loads.join_next() => {}
        }
    }
    Ok(())
}
