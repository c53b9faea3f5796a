use tracing::{info, warn};

use crate::sequence::ImageRef;

/// Class set on a scroll gallery while its next image loads.
pub const LOADING_CLASS: &str = "loading";
/// Class set on the scroll gallery once the sticky coordinator releases it.
pub const NO_STICKY_CLASS: &str = "no-sticky";

/// A viewer's container plus its display target.
pub trait Surface: Send + Sync + 'static {
    /// Render `reference` as the current image with an accessible label.
    fn show(&self, reference: &ImageRef, label: &str);
    /// Toggle a presentational class on the container.
    fn set_class(&self, class: &str, enabled: bool);
    /// Replace the container contents with an error message.
    fn show_error(&self, message: &str);
}

/// Surface that only reports what it would render.
#[derive(Debug, Clone)]
pub struct LogSurface {
    name: String,
}

impl LogSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Surface for LogSurface {
    fn show(&self, reference: &ImageRef, label: &str) {
        info!(surface = %self.name, %reference, label, "shown");
    }

    fn set_class(&self, class: &str, enabled: bool) {
        info!(surface = %self.name, class, enabled, "class");
    }

    fn show_error(&self, message: &str) {
        warn!(surface = %self.name, "{message}");
    }
}
