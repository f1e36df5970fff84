//! Request - batch に投入する FetchRequest

use std::fmt;

use super::item::Source;
use super::outcome::EntryOutcome;

/// Callback invoked exactly once with a request's terminal outcome.
pub type OutcomeCallback = Box<dyn FnOnce(EntryOutcome) + Send + 'static>;

/// One unit of a batch: a source address plus an optional outcome callback.
pub struct FetchRequest {
    source: Source,
    on_outcome: Option<OutcomeCallback>,
}

impl FetchRequest {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            on_outcome: None,
        }
    }

    /// Attach a callback that receives this request's terminal outcome
    /// (succeeded, failed or canceled).
    pub fn on_outcome<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(EntryOutcome) + Send + 'static,
    {
        self.on_outcome = Some(Box::new(callback));
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub(crate) fn into_parts(self) -> (Source, Option<OutcomeCallback>) {
        (self.source, self.on_outcome)
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("source", &self.source)
            .field("has_callback", &self.on_outcome.is_some())
            .finish()
    }
}

impl From<&str> for FetchRequest {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Source> for FetchRequest {
    fn from(source: Source) -> Self {
        Self::new(source)
    }
}
