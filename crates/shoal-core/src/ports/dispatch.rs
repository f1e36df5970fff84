//! Dispatcher port - イベント配送コンテキストの抽象化
//!
//! store の "content added" 通知、リクエストごとの callback、batch 完了 callback は
//! すべて Dispatcher 経由で実行されます。ホスト側が配送先（UI スレッド相当など）を決めます。

/// A unit of callback work handed to the host's delivery context.
pub type DispatchJob = Box<dyn FnOnce() + Send + 'static>;

/// Dispatcher runs callback jobs on the host-designated context.
///
/// Callers never hold a lock while dispatching, so an implementation may run
/// the job inline.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: DispatchJob);
}
