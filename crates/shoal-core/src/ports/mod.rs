//! Ports - core が外部コラボレータに要求するインターフェース
//!
//! - **Fetcher**: 1 件の fetch（ネットワーク・codec の詳細は実装側）
//! - **Dispatcher**: callback を配送する実行コンテキスト

pub mod dispatch;
pub mod fetcher;

pub use self::dispatch::{DispatchJob, Dispatcher};
pub use self::fetcher::Fetcher;
