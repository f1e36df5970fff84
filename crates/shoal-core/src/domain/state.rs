//! State - batch entry の状態機械

use serde::{Deserialize, Serialize};

/// State of one entry inside a batch.
///
/// State transitions:
/// - Pending -> Running -> Succeeded
/// - Pending -> Running -> Failed
/// - Pending -> Canceled
///
/// Running has no cancellation path: only work that has not started can be
/// canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Scheduled, waiting for a worker slot.
    Pending,

    /// The fetch operation has started.
    Running,

    Succeeded,

    Failed,

    /// Canceled before it started.
    Canceled,
}

impl EntryState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EntryState::Succeeded | EntryState::Failed | EntryState::Canceled
        )
    }

    pub fn is_cancelable(self) -> bool {
        matches!(self, EntryState::Pending)
    }
}
