//! BatchJob - 1 batch 分の状態（entry の状態、未完了数、最初のエラー）
//!
//! すべて 1 つの Mutex の中にあり、callback は lock の外で配送します。

use std::sync::{Mutex, PoisonError};

use crate::domain::{BatchId, EntryState, FetchError, FetchRequest, OutcomeCallback, Source};
use crate::observability::BatchProgress;
use crate::ports::Dispatcher;

/// Callback invoked once per batch with the lowest-index error, if any.
pub type CompletionCallback = Box<dyn FnOnce(Option<FetchError>) + Send + 'static>;

/// Terminal transition applied to an entry by `BatchJob::retire`.
#[derive(Debug)]
pub(crate) enum Terminal {
    Succeeded,
    Failed(FetchError),
    Canceled,
}

impl Terminal {
    fn state(&self) -> EntryState {
        match self {
            Terminal::Succeeded => EntryState::Succeeded,
            Terminal::Failed(_) => EntryState::Failed,
            Terminal::Canceled => EntryState::Canceled,
        }
    }
}

/// Why a cancel request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelMiss {
    OutOfRange,
    NotPending(EntryState),
}

/// The batch's completion, taken out of the job so it runs outside the lock.
#[must_use]
pub(crate) struct Completion {
    callback: CompletionCallback,
    first_error: Option<FetchError>,
}

impl Completion {
    pub(crate) fn deliver(self, dispatcher: &dyn Dispatcher) {
        let Completion {
            callback,
            first_error,
        } = self;
        dispatcher.dispatch(Box::new(move || callback(first_error)));
    }
}

struct Entry {
    source: Source,
    state: EntryState,
    on_outcome: Option<OutcomeCallback>,

    /// Counted against `outstanding` already.
    retired: bool,
}

struct JobInner {
    entries: Vec<Entry>,
    outstanding: usize,

    /// `(request index, error)` of the lowest-index failure seen so far.
    first_error: Option<(usize, FetchError)>,

    on_complete: Option<CompletionCallback>,
    completed: bool,
}

impl JobInner {
    fn take_completion(&mut self) -> Option<Completion> {
        if self.outstanding != 0 || self.completed {
            return None;
        }
        self.completed = true;
        let callback = self.on_complete.take()?;
        Some(Completion {
            callback,
            first_error: self.first_error.as_ref().map(|(_, err)| err.clone()),
        })
    }
}

/// Shared state of one batch.
///
/// Design:
/// - Every field lives under one mutex, so the outstanding decrement, the
///   entry's terminal state and the first-error capture are one step.
/// - Callbacks are handed back to the caller and never run under the lock.
pub(crate) struct BatchJob {
    id: BatchId,
    inner: Mutex<JobInner>,
}

impl BatchJob {
    pub(crate) fn new(
        id: BatchId,
        requests: Vec<FetchRequest>,
        on_complete: CompletionCallback,
    ) -> (Self, Vec<Source>) {
        let mut sources = Vec::with_capacity(requests.len());
        let entries: Vec<Entry> = requests
            .into_iter()
            .map(|request| {
                let (source, on_outcome) = request.into_parts();
                sources.push(source.clone());
                Entry {
                    source,
                    state: EntryState::Pending,
                    on_outcome,
                    retired: false,
                }
            })
            .collect();

        let job = Self {
            id,
            inner: Mutex::new(JobInner {
                outstanding: entries.len(),
                entries,
                first_error: None,
                on_complete: Some(on_complete),
                completed: false,
            }),
        };
        (job, sources)
    }

    pub(crate) fn id(&self) -> BatchId {
        self.id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JobInner> {
        // Nothing panics while holding this lock; a poisoned guard still
        // protects consistent counters.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pending -> Running. Returns false if the entry was canceled (or is
    /// otherwise not pending), in which case the operation must not start.
    pub(crate) fn begin(&self, index: usize) -> bool {
        let mut inner = self.lock();
        match inner.entries.get_mut(index) {
            Some(entry) if entry.state == EntryState::Pending => {
                entry.state = EntryState::Running;
                true
            }
            _ => false,
        }
    }

    /// Pending -> Canceled, checked under the lock. On success the entry's
    /// outcome callback (if any) is returned; the caller delivers it and then
    /// calls `retire(index, Terminal::Canceled)`.
    pub(crate) fn cancel(&self, index: usize) -> Result<Option<OutcomeCallback>, CancelMiss> {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(index) else {
            return Err(CancelMiss::OutOfRange);
        };
        if !entry.state.is_cancelable() {
            return Err(CancelMiss::NotPending(entry.state));
        }
        entry.state = EntryState::Canceled;
        Ok(entry.on_outcome.take())
    }

    /// Take a running entry's outcome callback, leaving the entry Running.
    pub(crate) fn take_outcome_callback(&self, index: usize) -> Option<OutcomeCallback> {
        self.lock()
            .entries
            .get_mut(index)
            .and_then(|entry| entry.on_outcome.take())
    }

    /// Move the entry to its terminal state, capture its error if it is the
    /// lowest-index failure, and decrement the outstanding count. Returns the
    /// batch completion when this was the last outstanding entry.
    pub(crate) fn retire(&self, index: usize, terminal: Terminal) -> Option<Completion> {
        let mut inner = self.lock();

        let Some(entry) = inner.entries.get_mut(index) else {
            tracing::warn!(batch = %self.id, index, "retire for unknown entry");
            return None;
        };
        if entry.retired {
            tracing::warn!(batch = %self.id, index, "entry retired twice; ignoring");
            return None;
        }
        entry.retired = true;
        entry.state = terminal.state();
        tracing::debug!(batch = %self.id, index, source = %entry.source, state = ?entry.state, "entry settled");

        if let Terminal::Failed(err) = terminal {
            let replace = match &inner.first_error {
                Some((first, _)) => index < *first,
                None => true,
            };
            if replace {
                inner.first_error = Some((index, err));
            }
        }

        inner.outstanding = inner.outstanding.saturating_sub(1);
        let completion = inner.take_completion();
        if completion.is_some() {
            tracing::info!(
                batch = %self.id,
                failed = inner.first_error.is_some(),
                "batch complete"
            );
        }
        completion
    }

    /// Completion for a batch with nothing outstanding (the empty batch).
    pub(crate) fn take_idle_completion(&self) -> Option<Completion> {
        self.lock().take_completion()
    }

    pub(crate) fn state(&self, index: usize) -> Option<EntryState> {
        self.lock().entries.get(index).map(|entry| entry.state)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.lock().completed
    }

    pub(crate) fn progress(&self) -> BatchProgress {
        let inner = self.lock();
        let mut progress = BatchProgress {
            total: inner.entries.len(),
            ..BatchProgress::default()
        };
        for entry in &inner.entries {
            match entry.state {
                EntryState::Pending => progress.pending += 1,
                EntryState::Running => progress.running += 1,
                EntryState::Succeeded => progress.succeeded += 1,
                EntryState::Failed => progress.failed += 1,
                EntryState::Canceled => progress.canceled += 1,
            }
        }
        progress
    }
}
