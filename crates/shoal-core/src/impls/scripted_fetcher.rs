//! ScriptedFetcher - 結果・遅延・到着順を台本で決める Fetcher（テスト・デモ用）
//!
//! # 使用例
//! ```ignore
//! let gate = Arc::new(Notify::new());
//! let fetcher = ScriptedFetcher::new()
//!     .succeed("a.png", b"a".to_vec())
//!     .fail("b.png", "404")
//!     .gated("b.png", Arc::clone(&gate));
//! // ... b.png resolves only after gate.notify_one()
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Notify;

use crate::domain::{FetchError, Item, Source};
use crate::ports::Fetcher;

/// Scripted result for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Succeed(Vec<u8>),
    Fail(String),
}

/// Settings for one source. Script, delay and gate may be set in any order.
#[derive(Debug, Clone, Default)]
struct Scene {
    script: Option<Script>,
    delay: Duration,
    gate: Option<Arc<Notify>>,
}

#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scenes: HashMap<Source, Scene>,
    jitter: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, source: impl Into<Source>, payload: Vec<u8>) -> Self {
        self.scene_mut(source.into()).script = Some(Script::Succeed(payload));
        self
    }

    pub fn fail(mut self, source: impl Into<Source>, cause: impl Into<String>) -> Self {
        self.scene_mut(source.into()).script = Some(Script::Fail(cause.into()));
        self
    }

    /// Fixed delay before the source resolves.
    pub fn delayed(mut self, source: impl Into<Source>, delay: Duration) -> Self {
        self.scene_mut(source.into()).delay = delay;
        self
    }

    /// The source resolves only after `gate` is notified. `Notify` keeps one
    /// permit, so notifying before the fetch starts also works.
    pub fn gated(mut self, source: impl Into<Source>, gate: Arc<Notify>) -> Self {
        self.scene_mut(source.into()).gate = Some(gate);
        self
    }

    /// Random extra delay in `0..=max` for every fetch.
    pub fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn scene_mut(&mut self, source: Source) -> &mut Scene {
        self.scenes.entry(source).or_default()
    }

    fn jitter_delay(&self) -> Duration {
        match self.jitter {
            Some(max) if !max.is_zero() => {
                let ms = rand::thread_rng().gen_range(0..=max.as_millis() as u64);
                Duration::from_millis(ms)
            }
            _ => Duration::ZERO,
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, source: &Source) -> Result<Item, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scene = self.scenes.get(source).cloned().unwrap_or_default();

        if let Some(gate) = &scene.gate {
            gate.notified().await;
        }
        let wait = scene.delay + self.jitter_delay();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        match scene.script {
            Some(Script::Succeed(payload)) => Ok(Item::new(source.clone(), payload)),
            Some(Script::Fail(cause)) => Err(FetchError::failed(source.clone(), cause)),
            None => Err(FetchError::failed(source.clone(), "no script for source")),
        }
    }
}
