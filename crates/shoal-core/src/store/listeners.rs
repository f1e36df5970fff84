//! ListenerRegistry - イベント種別ごとの listener 一覧

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{EventKind, ListenerId, StoreEvent};

/// A store listener. Shared so the handler list can be copied out of the
/// registry and invoked without holding its lock.
pub type ListenerFn = Arc<dyn Fn(&StoreEvent) + Send + Sync + 'static>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_kind: HashMap<EventKind, Vec<(ListenerId, ListenerFn)>>,
}

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, kind: EventKind, listener: ListenerFn) -> ListenerId {
        let id = ListenerId::generate();
        self.by_kind.entry(kind).or_default().push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for handlers in self.by_kind.values_mut() {
            let before = handlers.len();
            handlers.retain(|(registered, _)| *registered != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    /// Handlers for `kind` in registration order.
    pub(crate) fn handlers(&self, kind: EventKind) -> Vec<ListenerFn> {
        self.by_kind
            .get(&kind)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }
}
