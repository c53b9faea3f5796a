//! Discovery of `<prefix>_<NNN>.<ext>` image runs without a manifest.
//!
//! Every numeric slot in `1..=max_number` is tried with every extension. The
//! probe waits for all checks before ordering the survivors by number.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use image::ImageReader;
use tracing::{debug, info, instrument, trace};

use crate::error::LoadError;
use crate::sequence::{Candidate, ImageRef, Sequence};

pub const EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
pub const MAX_NUMBER: u32 = 1000;

/// Resolves image references. Implementations must report failure through
/// the returned future, never by panicking.
pub trait ImageSource: Send + Sync + 'static {
    /// Fully loads the image so it is ready to be shown.
    fn load(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>>;

    /// Existence check used while probing. Defaults to a full load.
    fn exists(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>> {
        self.load(reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub max_number: u32,
    pub extensions: Vec<String>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            max_number: MAX_NUMBER,
            extensions: EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl ProbeOptions {
    /// Every candidate for `prefix`, number-major then extension order.
    pub fn candidates(&self, prefix: &str) -> Vec<Candidate> {
        (1..=self.max_number)
            .flat_map(|number| {
                self.extensions
                    .iter()
                    .map(move |ext| Candidate::new(prefix, number, ext))
            })
            .collect()
    }
}

/// Probes `source` for every candidate of `prefix` and returns the ones that
/// exist, ordered by their number.
///
/// All checks are in flight at once; the result is only produced after the
/// last one resolves. When several extensions exist for one number they keep
/// the order of `options.extensions`.
#[instrument(skip(source, options), fields(max_number = options.max_number))]
pub async fn probe_sequence(
    source: &dyn ImageSource,
    prefix: &str,
    options: &ProbeOptions,
) -> Sequence {
    let candidates = options.candidates(prefix);
    let checks = candidates.iter().map(|candidate| {
        let reference = candidate.reference.clone();
        let check = source.exists(&reference);
        async move {
            match check.await {
                Ok(()) => true,
                Err(err) => {
                    trace!(%reference, %err, "probe miss");
                    false
                }
            }
        }
    });
    let results = join_all(checks).await;
    let issued = results.len();

    let mut found: Vec<Candidate> = candidates
        .into_iter()
        .zip(results)
        .filter_map(|(candidate, exists)| exists.then_some(candidate))
        .collect();
    // stable: equal numbers stay in extension order
    found.sort_by_key(|candidate| candidate.number);

    debug!(issued, found = found.len(), "probe complete");
    if found.is_empty() {
        info!(prefix, "no images matched");
    }
    found
        .into_iter()
        .map(|candidate| candidate.reference)
        .collect()
}

/// Images on the local filesystem, decoded with the `image` crate.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blocking<F>(&self, reference: &ImageRef, op: F) -> BoxFuture<'static, Result<(), LoadError>>
    where
        F: FnOnce(&Path, &str) -> Result<(), LoadError> + Send + 'static,
    {
        let path = self.root.join(reference.as_str());
        let reference = reference.to_string();
        async move {
            tokio::task::spawn_blocking(move || op(&path, &reference))
                .await
                .map_err(|err| LoadError::Aborted(err.to_string()))?
        }
        .boxed()
    }
}

impl ImageSource for DirectorySource {
    fn load(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>> {
        self.blocking(reference, |path, reference| {
            open_reader(path, reference)?
                .decode()
                .map_err(|err| decode_error(reference, err))?;
            Ok(())
        })
    }

    // Header sniffing is enough to know the file is an image.
    fn exists(&self, reference: &ImageRef) -> BoxFuture<'static, Result<(), LoadError>> {
        self.blocking(reference, |path, reference| {
            open_reader(path, reference)?
                .into_dimensions()
                .map_err(|err| decode_error(reference, err))?;
            Ok(())
        })
    }
}

fn open_reader(path: &Path, reference: &str) -> Result<ImageReader<BufReader<File>>, LoadError> {
    let reader = match ImageReader::open(path) {
        Ok(reader) => reader,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(LoadError::NotFound(reference.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(reader.with_guessed_format()?)
}

fn decode_error(reference: &str, err: image::ImageError) -> LoadError {
    LoadError::Decode {
        reference: reference.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_cover_every_number_and_extension() {
        let options = ProbeOptions {
            max_number: 12,
            ..ProbeOptions::default()
        };
        let candidates = options.candidates("g");
        assert_eq!(candidates.len(), 12 * EXTENSIONS.len());
        assert_eq!(candidates[0].reference.as_str(), "g_001.jpg");
        assert_eq!(candidates[4].reference.as_str(), "g_001.webp");
        assert_eq!(candidates[5].reference.as_str(), "g_002.jpg");
        assert_eq!(candidates.last().unwrap().reference.as_str(), "g_012.webp");
    }

    #[test]
    fn default_options_match_naming_convention() {
        let options = ProbeOptions::default();
        assert_eq!(options.max_number, 1000);
        assert_eq!(options.extensions, ["jpg", "jpeg", "png", "gif", "webp"]);
    }
}
