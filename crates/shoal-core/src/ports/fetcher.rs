//! Fetcher port - 外部の fetch 実装（ネットワーク、ファイル、codec）との境界
//!
//! core が消費するのは「1 回だけ結果を返す」という契約だけです。
//! リトライやタイムアウトは実装側の責務です。

use async_trait::async_trait;

use crate::domain::{FetchError, Item, Source};

/// Fetcher produces an item for a source, or an error.
///
/// Implementations that add timeouts or retries must still resolve the
/// future exactly once.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Item, FetchError>;
}
