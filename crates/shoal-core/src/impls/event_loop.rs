//! ChannelDispatcher / EventLoop - ホスト指定のイベント配送コンテキスト
//!
//! # 実装詳細
//! - tokio の unbounded mpsc で job を FIFO に流す
//! - `EventLoop` を drive するタスクが「UI スレッド相当」になる
//! - dispatch は lock を取らず、送るだけなので worker をブロックしない

use tokio::sync::mpsc;

use crate::ports::{DispatchJob, Dispatcher};

/// Sending half: hand this to the store and the coordinator.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<DispatchJob>,
}

/// Receiving half: the host drives it on its event-delivery context.
pub struct EventLoop {
    rx: mpsc::UnboundedReceiver<DispatchJob>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, EventLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, EventLoop { rx })
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, job: DispatchJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("event loop is gone; dropping dispatched callback");
        }
    }
}

impl EventLoop {
    /// Wait for the next job and run it.
    ///
    /// Returns false once every dispatcher has been dropped and the queue is
    /// drained.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run jobs until every dispatcher has been dropped.
    pub async fn run(mut self) {
        while self.turn().await {}
    }

    /// Run whatever is already queued without waiting. Returns how many
    /// jobs ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop").finish_non_exhaustive()
    }
}
