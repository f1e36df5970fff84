//! shoal-core
//!
//! batch で fetch した item を共有コレクションに集める並行処理コア
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, item, request, state, outcome, events, errors）
//! - **ports**: 外部コラボレータとの境界（Fetcher, Dispatcher）
//! - **store**: readers-writer で守られた append-only の ConcurrentStore
//! - **batch**: BatchCoordinator（1 batch につき完了 callback はちょうど 1 回）
//! - **impls**: ports の実装（InlineDispatcher, ChannelDispatcher, FileFetcher, ScriptedFetcher）
//! - **config**: ShoalConfig
//! - **observability**: BatchProgress

pub mod batch;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod store;

pub use batch::{BatchCoordinator, BatchHandle, BuildError, FetchOperation};
pub use config::{ConfigError, DispatchMode, ShoalConfig};
pub use domain::{EntryOutcome, EntryState, FetchError, FetchRequest, Item, Source};
pub use store::ConcurrentStore;
