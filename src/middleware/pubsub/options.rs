//! Construction-time configuration.

use std::fmt;
use std::sync::Arc;

use super::detect::{DefaultDetector, Detector};

/// Options for [`PushMiddleware`](super::PushMiddleware).
///
/// Built with chained setters, then frozen when passed to
/// [`PushMiddleware::new`](super::PushMiddleware::new).
///
/// ```rust
/// use pushgate::middleware::pubsub::PushOptions;
///
/// let options = PushOptions::new().prefixes(["/push/", "/webhooks/pubsub"]);
/// ```
#[derive(Clone)]
pub struct PushOptions {
    pub(crate) detector: Arc<dyn Detector>,
    pub(crate) prefixes: Vec<String>,
}

impl PushOptions {
    /// Default detector, every path.
    pub fn new() -> Self {
        Self { detector: Arc::new(DefaultDetector), prefixes: Vec::new() }
    }

    /// Replaces the envelope detector. Defaults to [`DefaultDetector`].
    pub fn detector(mut self, detector: impl Detector) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Only inspect requests whose path starts with one of `prefixes`.
    ///
    /// Plain string prefix checks. The list is copied, so the caller's
    /// collection is free to change afterwards. An empty list restores the
    /// default of inspecting every path.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for PushOptions {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for PushOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushOptions")
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}
