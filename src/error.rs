use thiserror::Error;

/// Failure to resolve an image reference into something displayable.
///
/// Never fatal: probes count it as "not found" and viewers keep showing
/// whatever they showed before.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing exists at the reference.
    #[error("image not found: {0}")]
    NotFound(String),

    /// The file exists but could not be decoded as an image.
    #[error("failed to decode {reference}: {reason}")]
    Decode { reference: String, reason: String },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The blocking decode task was cancelled or panicked.
    #[error("image load task aborted: {0}")]
    Aborted(String),
}
