//! CoordinatorBuilder - BatchCoordinator の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - fetcher / store が未設定なら build() で BuildError
//! - config は build() 時に validate
//! - tokio runtime は build() 時に捕捉する（run() 自体は同期で呼べる）

use std::sync::Arc;

use tokio::runtime::Handle;

use super::coordinator::BatchCoordinator;
use crate::config::{ConfigError, ShoalConfig};
use crate::ports::{Dispatcher, Fetcher};
use crate::store::ConcurrentStore;

/// BuildError は BatchCoordinator 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no fetcher configured; call `.fetcher(..)` before `build()`")]
    MissingFetcher,

    #[error("no store configured; call `.store(..)` before `build()`")]
    MissingStore,

    #[error("no tokio runtime: build inside a runtime or pass `.runtime(handle)`")]
    NoRuntime,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// # 使用例
/// ```ignore
/// let coordinator = BatchCoordinator::builder()
///     .fetcher(Arc::new(FileFetcher::new()))
///     .store(Arc::clone(&store))
///     .config(config)
///     .build()?;
/// ```
///
/// The dispatcher defaults to the store's, so batch callbacks and store
/// events share one delivery context.
#[derive(Default)]
pub struct CoordinatorBuilder {
    fetcher: Option<Arc<dyn Fetcher>>,
    store: Option<Arc<ConcurrentStore>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    runtime: Option<Handle>,
    config: ShoalConfig,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn store(mut self, store: Arc<ConcurrentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn config(mut self, config: ShoalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<BatchCoordinator, BuildError> {
        self.config.validate()?;
        let fetcher = self.fetcher.ok_or(BuildError::MissingFetcher)?;
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| BuildError::NoRuntime)?,
        };
        let dispatcher = self.dispatcher.unwrap_or_else(|| store.dispatcher());

        Ok(BatchCoordinator::from_parts(
            fetcher,
            store,
            dispatcher,
            runtime,
            self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InlineDispatcher, ScriptedFetcher};

    fn store() -> Arc<ConcurrentStore> {
        Arc::new(ConcurrentStore::new(Arc::new(InlineDispatcher)))
    }

    #[tokio::test]
    async fn test_build_success() {
        let coordinator = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .store(store())
            .build();
        assert!(coordinator.is_ok());
    }

    #[tokio::test]
    async fn test_build_missing_fetcher() {
        let result = CoordinatorBuilder::new().store(store()).build();
        assert!(matches!(result, Err(BuildError::MissingFetcher)));
    }

    #[tokio::test]
    async fn test_build_missing_store() {
        let result = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingStore)));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let result = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .store(store())
            .config(ShoalConfig {
                max_concurrent_fetches: 0,
                ..ShoalConfig::default()
            })
            .build();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[tokio::test]
    async fn test_build_rejects_pool_wider_than_semaphore() {
        let result = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .store(store())
            .config(ShoalConfig {
                max_concurrent_fetches: usize::MAX,
                ..ShoalConfig::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::Invalid {
                field: "max_concurrent_fetches",
                ..
            }))
        ));
    }

    #[test]
    fn test_build_outside_runtime() {
        let result = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .store(store())
            .build();
        assert!(matches!(result, Err(BuildError::NoRuntime)));
    }

    #[test]
    fn test_build_with_explicit_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let result = CoordinatorBuilder::new()
            .fetcher(Arc::new(ScriptedFetcher::new()))
            .store(store())
            .runtime(runtime.handle().clone())
            .build();
        assert!(result.is_ok());
    }
}
