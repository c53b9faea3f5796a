use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// File name of a single image, relative to the image source root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef(Arc<str>);

impl ImageRef {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One probed `(prefix, number, extension)` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub number: u32,
    pub reference: ImageRef,
}

impl Candidate {
    /// Builds `{prefix}_{number:03}.{extension}`.
    pub fn new(prefix: &str, number: u32, extension: &str) -> Self {
        Self {
            number,
            reference: ImageRef::new(format!("{prefix}_{number:03}.{extension}")),
        }
    }
}

/// Ordered, immutable list of discovered images.
///
/// Clones share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence {
    images: Arc<[ImageRef]>,
}

impl Sequence {
    pub fn new(images: Vec<ImageRef>) -> Self {
        Self {
            images: images.into(),
        }
    }

    pub fn last_index(&self) -> Option<usize> {
        self.images.len().checked_sub(1)
    }
}

impl Deref for Sequence {
    type Target = [ImageRef];

    fn deref(&self) -> &Self::Target {
        &self.images
    }
}

impl FromIterator<ImageRef> for Sequence {
    fn from_iter<T: IntoIterator<Item = ImageRef>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
