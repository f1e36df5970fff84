//! Errors - エラー型
//!
//! core の内部で発生するエラーは `FetchFailed` だけです。
//! 1 件の失敗は batch を止めず、batch は最小 index の失敗だけを報告します。

use super::item::Source;

/// A single request's underlying fetch failed.
///
/// `Clone` because the same error is handed to the per-request callback and,
/// if it is the lowest-index failure, to the batch completion callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("fetch failed for {address}: {cause}")]
    FetchFailed { address: Source, cause: String },
}

impl FetchError {
    pub fn failed(address: Source, cause: impl Into<String>) -> Self {
        Self::FetchFailed {
            address,
            cause: cause.into(),
        }
    }

    /// The source whose fetch failed.
    pub fn address(&self) -> &Source {
        match self {
            Self::FetchFailed { address, .. } => address,
        }
    }

    pub fn cause(&self) -> &str {
        match self {
            Self::FetchFailed { cause, .. } => cause,
        }
    }
}
