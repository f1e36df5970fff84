//! BatchCoordinator - batch の実行と完了通知
//!
//! # 保証
//! - 完了 callback は 1 batch につきちょうど 1 回
//! - 報告するエラーは最小 index の失敗（到着順に依存しない）
//! - キャンセルできるのは開始前の entry だけ

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use super::builder::CoordinatorBuilder;
use super::job::{BatchJob, Terminal};
use super::operation::FetchOperation;
use crate::config::ShoalConfig;
use crate::domain::{BatchId, EntryOutcome, EntryState, FetchError, FetchRequest, Item, Source};
use crate::observability::BatchProgress;
use crate::ports::{Dispatcher, Fetcher};
use crate::store::ConcurrentStore;

/// Launches one `FetchOperation` per request on a bounded worker pool.
///
/// Flow per entry:
/// 1. wait for a worker slot (semaphore permit)
/// 2. `Pending -> Running` under the job lock (skipped if canceled meanwhile)
/// 3. fetch; on success append the item to the store
/// 4. deliver the request's outcome callback
/// 5. retire the entry; the last one out delivers the batch completion
pub struct BatchCoordinator {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<ConcurrentStore>,
    dispatcher: Arc<dyn Dispatcher>,
    workers: Arc<Semaphore>,
    runtime: Handle,
    config: ShoalConfig,
}

impl BatchCoordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    pub(crate) fn from_parts(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<ConcurrentStore>,
        dispatcher: Arc<dyn Dispatcher>,
        runtime: Handle,
        config: ShoalConfig,
    ) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
            fetcher,
            store,
            dispatcher,
            runtime,
            config,
        }
    }

    pub fn store(&self) -> &Arc<ConcurrentStore> {
        &self.store
    }

    pub fn config(&self) -> &ShoalConfig {
        &self.config
    }

    /// Start a batch and return immediately.
    ///
    /// `on_complete` runs exactly once on the dispatcher, after every request
    /// has succeeded, failed or been canceled, with the error of the
    /// lowest-index failed request. An empty batch completes right away with
    /// `None`.
    pub fn run<F>(&self, requests: Vec<FetchRequest>, on_complete: F) -> BatchHandle
    where
        F: FnOnce(Option<FetchError>) + Send + 'static,
    {
        let id = BatchId::generate();
        let (job, sources) = BatchJob::new(id, requests, Box::new(on_complete));
        let job = Arc::new(job);
        tracing::info!(batch = %id, requests = sources.len(), "batch started");

        if sources.is_empty() {
            if let Some(completion) = job.take_idle_completion() {
                tracing::info!(batch = %id, "empty batch complete");
                completion.deliver(self.dispatcher.as_ref());
            }
        }

        for (index, source) in sources.into_iter().enumerate() {
            let worker = EntryWorker {
                job: Arc::clone(&job),
                index,
                fetcher: Arc::clone(&self.fetcher),
                store: Arc::clone(&self.store),
                dispatcher: Arc::clone(&self.dispatcher),
                workers: Arc::clone(&self.workers),
            };
            self.runtime.spawn(worker.run(source));
        }

        BatchHandle {
            job,
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("config", &self.config)
            .field("available_workers", &self.workers.available_permits())
            .finish_non_exhaustive()
    }
}

/// Everything one entry's task needs.
struct EntryWorker {
    job: Arc<BatchJob>,
    index: usize,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<ConcurrentStore>,
    dispatcher: Arc<dyn Dispatcher>,
    workers: Arc<Semaphore>,
}

impl EntryWorker {
    async fn run(self, source: Source) {
        let permit = match Arc::clone(&self.workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // The semaphore is never closed; treat it as a failed fetch
                // so the batch still completes.
                if self.job.begin(self.index) {
                    let err = FetchError::failed(source, "worker pool closed");
                    self.settle(Err(err));
                }
                return;
            }
        };

        if !self.job.begin(self.index) {
            tracing::debug!(batch = %self.job.id(), index = self.index, "entry canceled before start");
            return;
        }
        tracing::debug!(batch = %self.job.id(), index = self.index, source = %source, "entry started");

        let operation = FetchOperation::new(Arc::clone(&self.fetcher), source);
        operation.start(|result| self.settle(result)).await;
        drop(permit);
    }

    fn settle(&self, result: Result<Item, FetchError>) {
        let (terminal, outcome) = match result {
            Ok(item) => {
                let item = Arc::new(item);
                self.store.append(Arc::clone(&item));
                (Terminal::Succeeded, EntryOutcome::Succeeded(item))
            }
            Err(err) => {
                tracing::warn!(batch = %self.job.id(), index = self.index, "{err}");
                (Terminal::Failed(err.clone()), EntryOutcome::Failed(err))
            }
        };

        if let Some(callback) = self.job.take_outcome_callback(self.index) {
            self.dispatcher.dispatch(Box::new(move || callback(outcome)));
        }

        if let Some(completion) = self.job.retire(self.index, terminal) {
            completion.deliver(self.dispatcher.as_ref());
        }
    }
}

/// Handle to a running batch.
#[derive(Clone)]
pub struct BatchHandle {
    job: Arc<BatchJob>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl BatchHandle {
    pub fn id(&self) -> BatchId {
        self.job.id()
    }

    pub fn len(&self) -> usize {
        self.job.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel the entry at `index` if it has not started.
    ///
    /// Returns false (and changes nothing) for out-of-range indices and for
    /// entries that are already running or settled.
    pub fn cancel(&self, index: usize) -> bool {
        let callback = match self.job.cancel(index) {
            Ok(callback) => callback,
            Err(miss) => {
                tracing::debug!(batch = %self.job.id(), index, ?miss, "cancel had no effect");
                return false;
            }
        };

        if let Some(callback) = callback {
            self.dispatcher
                .dispatch(Box::new(move || callback(EntryOutcome::Canceled)));
        }
        if let Some(completion) = self.job.retire(index, Terminal::Canceled) {
            completion.deliver(self.dispatcher.as_ref());
        }
        true
    }

    /// Cancel every entry that has not started yet. Returns how many were
    /// canceled.
    pub fn cancel_pending(&self) -> usize {
        (0..self.len()).filter(|&index| self.cancel(index)).count()
    }

    pub fn state(&self, index: usize) -> Option<EntryState> {
        self.job.state(index)
    }

    pub fn progress(&self) -> BatchProgress {
        self.job.progress()
    }

    /// Whether the completion callback has been handed to the dispatcher.
    pub fn is_complete(&self) -> bool {
        self.job.is_complete()
    }
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHandle")
            .field("id", &self.id())
            .field("progress", &self.progress())
            .finish()
    }
}
