//! FetchOperation - 結果をちょうど 1 回返す 1 件の fetch

use std::sync::Arc;

use crate::domain::{FetchError, Item, Source};
use crate::ports::Fetcher;

/// One unit of fetch work.
///
/// `start` consumes the operation and its `FnOnce` callback, so the outcome
/// is delivered at most once by construction; an operation that is never
/// started never calls back. The fetch runs in its own task so a panicking
/// fetcher still produces an outcome.
pub struct FetchOperation {
    fetcher: Arc<dyn Fetcher>,
    source: Source,
}

impl FetchOperation {
    pub fn new(fetcher: Arc<dyn Fetcher>, source: Source) -> Self {
        Self { fetcher, source }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Run the fetch and pass its result to `on_done`.
    pub async fn start<F>(self, on_done: F)
    where
        F: FnOnce(Result<Item, FetchError>) + Send,
    {
        let Self { fetcher, source } = self;

        let task_source = source.clone();
        let joined = tokio::spawn(async move { fetcher.fetch(&task_source).await }).await;

        let result = match joined {
            Ok(result) => result,
            Err(join_err) => {
                tracing::warn!(source = %source, "fetch task did not finish: {join_err}");
                Err(FetchError::failed(
                    source,
                    format!("fetch task did not finish: {join_err}"),
                ))
            }
        };
        on_done(result);
    }
}

impl std::fmt::Debug for FetchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOperation")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedFetcher;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct PanickingFetcher;

    #[async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, _source: &Source) -> Result<Item, FetchError> {
            panic!("decoder exploded");
        }
    }

    async fn run(fetcher: Arc<dyn Fetcher>, source: &str) -> Vec<Result<Item, FetchError>> {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        FetchOperation::new(fetcher, Source::new(source))
            .start(move |result| sink.lock().unwrap().push(result))
            .await;
        let results = results.lock().unwrap();
        results.clone()
    }

    #[tokio::test]
    async fn success_is_reported_once() {
        let fetcher = Arc::new(ScriptedFetcher::new().succeed("a", b"A".to_vec()));
        let results = run(fetcher, "a").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().payload(), b"A");
    }

    #[tokio::test]
    async fn failure_is_reported_once() {
        let fetcher = Arc::new(ScriptedFetcher::new().fail("a", "timeout"));
        let results = run(fetcher, "a").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap_err().cause(), "timeout");
    }

    #[tokio::test]
    async fn panicking_fetcher_becomes_fetch_failed() {
        let results = run(Arc::new(PanickingFetcher), "boom.png").await;
        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert_eq!(err.address().as_str(), "boom.png");
    }
}
