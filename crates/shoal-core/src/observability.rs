//! Observability - batch の進捗カウンタ

use serde::{Deserialize, Serialize};

/// Per-state entry counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub canceled: usize,
}

impl BatchProgress {
    /// Entries that reached a terminal state.
    pub fn settled(&self) -> usize {
        self.succeeded + self.failed + self.canceled
    }

    /// Fraction settled in `0.0..=1.0`; an empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.settled() as f64 / self.total as f64
        }
    }
}
