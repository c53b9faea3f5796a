use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::events::ScrollPosition;
use crate::surface::{NO_STICKY_CLASS, Surface};

/// The scroll gallery stops sticking once the trigger's top edge is on screen.
pub fn should_release(position: &ScrollPosition) -> bool {
    position.trigger_top < position.viewport_height
}

/// Mirrors the page scroll position onto the scroll gallery's `no-sticky` class.
#[instrument(skip_all)]
pub async fn run(
    target: Arc<dyn Surface>,
    mut positions: watch::Receiver<ScrollPosition>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut released = should_release(&positions.borrow_and_update());
    target.set_class(NO_STICKY_CLASS, released);

    loop {
        select! {
            _ = cancel.cancelled() => break,
            changed = positions.changed() => {
                if changed.is_err() {
                    debug!("scroll position source closed");
                    break;
                }
                let next = should_release(&positions.borrow_and_update());
                if next != released {
                    released = next;
                    debug!(released, "sticky state changed");
                    target.set_class(NO_STICKY_CLASS, released);
                }
            }
        }
    }
    Ok(())
}
