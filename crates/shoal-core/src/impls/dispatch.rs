//! InlineDispatcher - callback をその場で実行する Dispatcher

use crate::ports::{DispatchJob, Dispatcher};

/// Runs every job immediately on the calling thread.
///
/// Listeners and completion callbacks then run on whichever worker
/// finished the triggering operation. Suitable for tests and hosts without
/// a dedicated event context.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, job: DispatchJob) {
        job();
    }
}
