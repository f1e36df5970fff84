//! Store - 共有される append-only の item コレクションと listener

mod concurrent;
mod listeners;

pub use concurrent::ConcurrentStore;
pub use listeners::ListenerFn;
