//! In-memory collaborators for exercising the galleries without a display.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::LoadError;
use crate::probe::ImageSource;
use crate::sequence::ImageRef;
use crate::surface::Surface;

/// Image source backed by a set of names.
///
/// Names added with [`MemorySource::with_broken`] pass the existence probe but
/// fail to load.
#[derive(Debug, Default)]
pub struct MemorySource {
    present: HashSet<String>,
    broken: HashSet<String>,
    delay: Duration,
    exists_calls: AtomicUsize,
    load_calls: AtomicUsize,
}

impl MemorySource {
    pub fn with_images<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            present: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_broken(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.present.insert(name.clone());
        self.broken.insert(name);
        self
    }

    /// Every check and load resolves only after `delay` (tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn resolve(&self, outcome: Result<(), LoadError>) -> BoxFuture<'static, Result<(), LoadError>> {
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome
        }
        .boxed()
    }
}

impl ImageSource for MemorySource {
    fn load(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let name = reference.as_str();
        let outcome = if self.broken.contains(name) {
            Err(LoadError::Decode {
                reference: name.to_string(),
                reason: "corrupt test image".into(),
            })
        } else if self.present.contains(name) {
            Ok(())
        } else {
            Err(LoadError::NotFound(name.to_string()))
        };
        self.resolve(outcome)
    }

    fn exists(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        let name = reference.as_str();
        let outcome = if self.present.contains(name) {
            Ok(())
        } else {
            Err(LoadError::NotFound(name.to_string()))
        };
        self.resolve(outcome)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Shown { reference: String, label: String },
    Class { class: String, enabled: bool },
    Error(String),
}

/// Surface that remembers every call in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.lock().clone()
    }

    /// References shown so far, oldest first.
    pub fn shown(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Shown { reference, .. } => Some(reference.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_label(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|event| match event {
            SurfaceEvent::Shown { label, .. } => Some(label.clone()),
            _ => None,
        })
    }

    /// Most recent state of `class`, if it was ever touched.
    pub fn class_enabled(&self, class: &str) -> Option<bool> {
        self.lock().iter().rev().find_map(|event| match event {
            SurfaceEvent::Class { class: c, enabled } if c == class => Some(*enabled),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SurfaceEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceEvent>> {
        // history stays readable after a panic in another test thread
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Surface for RecordingSurface {
    fn show(&self, reference: &ImageRef, label: &str) {
        self.push(SurfaceEvent::Shown {
            reference: reference.to_string(),
            label: label.to_string(),
        });
    }

    fn set_class(&self, class: &str, enabled: bool) {
        self.push(SurfaceEvent::Class {
            class: class.to_string(),
            enabled,
        });
    }

    fn show_error(&self, message: &str) {
        self.push(SurfaceEvent::Error(message.to_string()));
    }
}
