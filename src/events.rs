use tokio::sync::oneshot;

/// What the page should do with a wheel event after the scroll gallery saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDisposition {
    /// Let the page scroll normally.
    PassThrough,
    /// The gallery consumed it; suppress default scrolling.
    Consumed,
}

/// Raw wheel/trackpad input delivered to the scroll gallery.
#[derive(Debug)]
pub struct WheelGesture {
    pub delta_y: f64,
    pub respond: Option<oneshot::Sender<WheelDisposition>>,
}

impl WheelGesture {
    pub fn new(delta_y: f64) -> Self {
        Self {
            delta_y,
            respond: None,
        }
    }

    /// Gesture paired with a receiver for the gallery's decision.
    pub fn with_reply(delta_y: f64) -> (Self, oneshot::Receiver<WheelDisposition>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                delta_y,
                respond: Some(tx),
            },
            rx,
        )
    }

    /// Answer the sender; a dropped receiver is not an error.
    pub fn reply(self, disposition: WheelDisposition) {
        if let Some(tx) = self.respond {
            let _ = tx.send(disposition);
        }
    }
}

/// Layout sample used by the sticky coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    /// Top edge of the one-shot gallery relative to the viewport.
    pub trigger_top: f64,
    pub viewport_height: f64,
}

impl Default for ScrollPosition {
    fn default() -> Self {
        Self {
            trigger_top: f64::INFINITY,
            viewport_height: 0.0,
        }
    }
}
