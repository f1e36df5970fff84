//! Events - store が発行するイベント

use super::item::Source;

/// Kind of store event a listener subscribes to.
///
/// store には append しかないので、更新系のイベント種別は持たない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContentAdded,
}

/// Event delivered to store listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// An item became visible at `index` (its position in the store).
    ContentAdded { index: usize, source: Source },
}

impl StoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::ContentAdded { .. } => EventKind::ContentAdded,
        }
    }
}
