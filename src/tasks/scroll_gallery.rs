//! Manually advanced gallery driven by wheel gestures.
//!
//! Wheel input arrives in bursts, so a gesture must clear two gates before it
//! moves the show: a minimum spacing since the previous spaced gesture, and
//! the transition lock held from the start of a load until `settle-delay`
//! after it finishes. Once the last image is showing, downward gestures are
//! handed back to the page.

use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ScrollGalleryConfig;
use crate::error::LoadError;
use crate::events::{WheelDisposition, WheelGesture};
use crate::gallery::{GalleryContext, label_for};
use crate::sequence::Sequence;
use crate::surface::LOADING_CLASS;

/// Message shown instead of the gallery when no image matched `prefix`.
pub fn missing_images_message(prefix: &str) -> String {
    format!(
        "No image files found.\n\
         Image file names must use the {prefix}_number format (e.g. {prefix}_001.jpg, {prefix}_002.png).\n\
         Numbers must be zero-padded to 3 digits (001, 002, 003...).\n\
         Place the image files in the image folder next to this page."
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOutcome {
    pub disposition: WheelDisposition,
    /// Index whose transition must start now.
    pub show: Option<usize>,
}

impl GestureOutcome {
    const PASS_THROUGH: Self = Self {
        disposition: WheelDisposition::PassThrough,
        show: None,
    };

    const fn consumed(show: Option<usize>) -> Self {
        Self {
            disposition: WheelDisposition::Consumed,
            show,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollState {
    len: usize,
    current_index: usize,
    is_advancing: bool,
    is_last_image: bool,
    last_spaced: Option<Instant>,
    gesture_spacing: Duration,
}

impl ScrollState {
    /// `None` for an empty sequence.
    pub fn new(len: usize, gesture_spacing: Duration) -> Option<Self> {
        (len > 0).then(|| Self {
            len,
            current_index: 0,
            is_advancing: false,
            is_last_image: len == 1,
            last_spaced: None,
            gesture_spacing,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_advancing(&self) -> bool {
        self.is_advancing
    }

    pub fn is_last_image(&self) -> bool {
        self.is_last_image
    }

    /// Starts a transition to the current index.
    pub fn show_current(&mut self) -> usize {
        self.is_advancing = true;
        self.current_index
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.current_index + 1 < self.len {
            self.current_index += 1;
            self.is_last_image = self.current_index + 1 == self.len;
            Some(self.show_current())
        } else {
            self.is_last_image = true;
            None
        }
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.current_index == 0 {
            return None;
        }
        self.current_index -= 1;
        self.is_last_image = false;
        Some(self.show_current())
    }

    /// Releases the transition lock.
    pub fn finish_transition(&mut self) {
        self.is_advancing = false;
    }

    pub fn on_gesture(&mut self, delta_y: f64, now: Instant) -> GestureOutcome {
        if self.is_last_image && delta_y > 0.0 {
            return GestureOutcome::PASS_THROUGH;
        }
        let too_soon = self
            .last_spaced
            .is_some_and(|last| now.saturating_duration_since(last) < self.gesture_spacing);
        if too_soon {
            return GestureOutcome::consumed(None);
        }
        self.last_spaced = Some(now);
        if self.is_advancing {
            return GestureOutcome::consumed(None);
        }
        let show = if delta_y > 0.0 { self.next() } else { self.prev() };
        GestureOutcome::consumed(show)
    }
}

type Transition = (usize, Result<(), LoadError>);

#[instrument(skip_all, fields(prefix = %cfg.prefix))]
pub async fn run(
    cfg: ScrollGalleryConfig,
    ctx: GalleryContext,
    mut gestures: Receiver<WheelGesture>,
    cancel: CancellationToken,
) -> Result<()> {
    let probe = ctx.discover(&cfg.prefix);
    tokio::pin!(probe);
    // nothing is listening yet, so the page keeps its scroll
    let sequence = loop {
        select! {
            _ = cancel.cancelled() => return Ok(()),
            sequence = &mut probe => break sequence,
            Some(gesture) = gestures.recv() => gesture.reply(WheelDisposition::PassThrough),
        }
    };

    let Some(mut state) = ScrollState::new(sequence.len(), cfg.gesture_spacing) else {
        ctx.surface.show_error(&missing_images_message(&cfg.prefix));
        warn!("no images discovered; gallery disabled");
        loop {
            select! {
                _ = cancel.cancelled() => break,
                maybe = gestures.recv() => match maybe {
                    Some(gesture) => gesture.reply(WheelDisposition::PassThrough),
                    None => break,
                },
            }
        }
        return Ok(());
    };
    info!(images = sequence.len(), "scroll gallery ready");

    let mut loads: JoinSet<Transition> = JoinSet::new();
    let mut release_at: Option<Instant> = None;
    begin_transition(&ctx, &sequence, &mut loads, state.show_current());

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe = gestures.recv() => {
                let Some(gesture) = maybe else {
                    debug!("gesture source closed");
                    break;
                };
                let outcome = state.on_gesture(gesture.delta_y, Instant::now());
                gesture.reply(outcome.disposition);
                if let Some(index) = outcome.show {
                    debug!(index, "advancing");
                    begin_transition(&ctx, &sequence, &mut loads, index);
                }
            }

            Some(joined) = loads.join_next() => {
                ctx.surface.set_class(LOADING_CLASS, false);
                match joined {
                    Ok((index, Ok(()))) => {
                        ctx.surface.show(&sequence[index], &label_for(&cfg.label, index));
                        release_at = Some(Instant::now() + cfg.settle_delay);
                    }
                    Ok((index, Err(err))) => {
                        warn!(reference = %sequence[index], %err, "failed to load image");
                        state.finish_transition();
                    }
                    Err(err) => {
                        warn!(%err, "image load task failed");
                        state.finish_transition();
                    }
                }
            }

            _ = sleep_until(release_at.unwrap_or_else(Instant::now)), if release_at.is_some() => {
                release_at = None;
                state.finish_transition();
            }
        }
    }
    Ok(())
}

fn begin_transition(
    ctx: &GalleryContext,
    sequence: &Sequence,
    loads: &mut JoinSet<Transition>,
    index: usize,
) {
    ctx.surface.set_class(LOADING_CLASS, true);
    let load = ctx.source.load(&sequence[index]);
    loads.spawn(async move { (index, load.await) });
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACING: Duration = Duration::from_millis(150);

    fn settled(len: usize) -> ScrollState {
        let mut state = ScrollState::new(len, SPACING).unwrap();
        state.show_current();
        state.finish_transition();
        state
    }

    #[test]
    fn empty_sequence_has_no_state() {
        assert!(ScrollState::new(0, SPACING).is_none());
    }

    #[test]
    fn single_image_starts_on_last_slide() {
        let state = ScrollState::new(1, SPACING).unwrap();
        assert!(state.is_last_image());
        assert!(!ScrollState::new(2, SPACING).unwrap().is_last_image());
    }

    #[test]
    fn next_at_last_index_only_flags_the_end() {
        let mut state = settled(2);
        assert_eq!(state.next(), Some(1));
        state.finish_transition();
        assert!(state.is_last_image());
        assert_eq!(state.next(), None);
        assert_eq!(state.next(), None);
        assert_eq!(state.current_index(), 1);
        assert!(state.is_last_image());
        assert!(!state.is_advancing());
    }

    #[test]
    fn prev_at_first_index_is_a_no_op() {
        let mut state = settled(3);
        assert_eq!(state.prev(), None);
        assert_eq!(state.current_index(), 0);
        assert!(!state.is_advancing());
    }

    #[test]
    fn prev_clears_last_image_flag() {
        let mut state = settled(2);
        state.next();
        state.finish_transition();
        assert_eq!(state.prev(), Some(0));
        assert!(!state.is_last_image());
        assert!(state.is_advancing());
    }

    #[test]
    fn gestures_inside_spacing_window_are_dropped() {
        let t0 = Instant::now();
        let mut state = settled(5);
        let first = state.on_gesture(40.0, t0);
        state.finish_transition();
        let second = state.on_gesture(40.0, t0 + Duration::from_millis(10));
        assert_eq!(first.show, Some(1));
        assert_eq!(second, GestureOutcome::consumed(None));
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn lock_blocks_spaced_gestures_until_released() {
        let t0 = Instant::now();
        let mut state = settled(5);
        assert_eq!(state.on_gesture(40.0, t0).show, Some(1));
        assert_eq!(state.on_gesture(40.0, t0 + Duration::from_millis(200)).show, None);
        state.finish_transition();
        assert_eq!(state.on_gesture(40.0, t0 + Duration::from_millis(400)).show, Some(2));
    }

    #[test]
    fn last_slide_hands_downward_scroll_to_the_page() {
        let t0 = Instant::now();
        let mut state = settled(2);
        state.next();
        state.finish_transition();

        let down = state.on_gesture(40.0, t0);
        assert_eq!(down, GestureOutcome::PASS_THROUGH);

        let up = state.on_gesture(-40.0, t0 + Duration::from_millis(1));
        assert_eq!(up.disposition, WheelDisposition::Consumed);
        assert_eq!(up.show, Some(0));
    }

    #[test]
    fn missing_message_names_the_prefix() {
        assert_eq!(
            missing_images_message("h"),
            "No image files found.\n\
             Image file names must use the h_number format (e.g. h_001.jpg, h_002.png).\n\
             Numbers must be zero-padded to 3 digits (001, 002, 003...).\n\
             Place the image files in the image folder next to this page."
        );
    }
}
