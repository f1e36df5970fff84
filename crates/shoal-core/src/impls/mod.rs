//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InlineDispatcher**: 呼び出しスレッドでそのまま callback を実行
//! - **ChannelDispatcher / EventLoop**: ホストが drive するイベントループへ配送
//! - **FileFetcher**: ローカルファイルを読む
//! - **ScriptedFetcher**: テスト・デモ用に結果と到着順を制御

pub mod dispatch;
pub mod event_loop;
pub mod file_fetcher;
pub mod scripted_fetcher;

pub use self::dispatch::InlineDispatcher;
pub use self::event_loop::{ChannelDispatcher, EventLoop};
pub use self::file_fetcher::FileFetcher;
pub use self::scripted_fetcher::{Script, ScriptedFetcher};
