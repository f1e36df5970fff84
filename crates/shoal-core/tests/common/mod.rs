#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shoal_core::impls::{InlineDispatcher, ScriptedFetcher};
use shoal_core::{BatchCoordinator, ConcurrentStore, FetchError, ShoalConfig, Source};
use tokio::sync::oneshot;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub coordinator: BatchCoordinator,
    pub store: Arc<ConcurrentStore>,
    pub fetcher: Arc<ScriptedFetcher>,
}

/// Coordinator over `fetcher` with inline dispatch and `workers` slots.
pub fn harness(fetcher: ScriptedFetcher, workers: usize) -> Harness {
    enable_tracing();
    let store = Arc::new(ConcurrentStore::new(Arc::new(InlineDispatcher)));
    let fetcher = Arc::new(fetcher);
    let coordinator = BatchCoordinator::builder()
        .fetcher(fetcher.clone())
        .store(Arc::clone(&store))
        .config(ShoalConfig {
            max_concurrent_fetches: workers,
            ..ShoalConfig::default()
        })
        .build()
        .unwrap();
    Harness {
        coordinator,
        store,
        fetcher,
    }
}

/// Completion callback that counts its invocations and forwards the first
/// one to a oneshot receiver.
pub struct CompletionProbe {
    pub calls: Arc<AtomicUsize>,
    pub rx: oneshot::Receiver<Option<FetchError>>,
}

pub fn completion_probe() -> (
    impl FnOnce(Option<FetchError>) + Send + 'static,
    CompletionProbe,
) {
    let (tx, rx) = oneshot::channel();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let callback = move |err| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(err);
    };
    (callback, CompletionProbe { calls, rx })
}

impl CompletionProbe {
    pub async fn wait(self) -> (Option<FetchError>, Arc<AtomicUsize>) {
        let err = tokio::time::timeout(Duration::from_secs(5), self.rx)
            .await
            .expect("batch did not complete in time")
            .expect("completion callback dropped");
        (err, self.calls)
    }
}

/// Poll `condition` until it holds (or fail after 5 seconds).
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

pub fn source(i: usize) -> Source {
    Source::new(format!("photo-{i}.png"))
}

pub fn error_for(i: usize) -> FetchError {
    FetchError::failed(source(i), format!("E{i}"))
}
