//! Batch - job の状態、FetchOperation、BatchCoordinator

mod builder;
mod coordinator;
mod job;
mod operation;

pub use builder::{BuildError, CoordinatorBuilder};
pub use coordinator::{BatchCoordinator, BatchHandle};
pub use job::CompletionCallback;
pub use operation::FetchOperation;
