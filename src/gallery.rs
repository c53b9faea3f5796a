use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use crate::probe::{ImageSource, ProbeOptions, probe_sequence};
use crate::sequence::{ImageRef, Sequence};
use crate::surface::Surface;

/// Everything a viewer needs from the outside world.
#[derive(Clone)]
pub struct GalleryContext {
    pub source: Arc<dyn ImageSource>,
    pub surface: Arc<dyn Surface>,
    pub probe: ProbeOptions,
}

impl GalleryContext {
    pub fn new(source: Arc<dyn ImageSource>, surface: Arc<dyn Surface>) -> Self {
        Self {
            source,
            surface,
            probe: ProbeOptions::default(),
        }
    }

    pub fn with_probe_options(mut self, probe: ProbeOptions) -> Self {
        self.probe = probe;
        self
    }

    pub async fn discover(&self, prefix: &str) -> Sequence {
        probe_sequence(self.source.as_ref(), prefix, &self.probe).await
    }

    /// Loads `reference` and shows it when ready, without waiting.
    ///
    /// Loads may finish out of order; the last one to finish wins.
    pub(crate) fn display_detached(&self, loads: &mut JoinSet<()>, reference: &ImageRef, label: String) {
        let load = self.source.load(reference);
        let surface = Arc::clone(&self.surface);
        let reference = reference.clone();
        loads.spawn(async move {
            match load.await {
                Ok(()) => surface.show(&reference, &label),
                Err(err) => warn!(%reference, %err, "frame failed to load"),
            }
        });
    }
}

pub(crate) fn label_for(label: &str, index: usize) -> String {
    format!("{label} {}", index + 1)
}
