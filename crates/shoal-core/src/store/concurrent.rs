//! ConcurrentStore - readers-writer lock で守られた append-only の item リスト
//!
//! # 実装詳細
//! - snapshot は read lock、append は write lock
//! - listener への通知は write lock を外してから Dispatcher 経由で行う

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::listeners::{ListenerFn, ListenerRegistry};
use crate::domain::{EventKind, Item, ListenerId, StoreEvent};
use crate::ports::Dispatcher;

/// Shared item collection.
///
/// - Any number of `snapshot()` calls run in parallel.
/// - `append()` takes the write lock, so it excludes readers and other
///   writers; a reader sees either the list before the push or after it.
/// - Listeners are notified through the dispatcher after the write lock is
///   released, so a listener may read the store again.
///
/// The host constructs one store and shares it with `Arc`; nothing here is
/// global.
pub struct ConcurrentStore {
    items: RwLock<Vec<Arc<Item>>>,
    listeners: RwLock<ListenerRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl ConcurrentStore {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            listeners: RwLock::new(ListenerRegistry::default()),
            dispatcher,
        }
    }

    /// Copy of the current contents, newest last.
    pub fn snapshot(&self) -> Vec<Arc<Item>> {
        // Writers never panic while holding the lock, so a poisoned lock
        // still guards a consistent vector.
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `item` at the end and notify `ContentAdded` listeners.
    ///
    /// Accepts an `Item` or an `Arc<Item>` the caller keeps sharing; the
    /// payload is never copied.
    ///
    /// The event's `index` is the item's position, captured under the write
    /// lock. Events are handed to the dispatcher after the lock is released,
    /// so with concurrent appends a listener may see index 5 before index 4.
    pub fn append(&self, item: impl Into<Arc<Item>>) {
        let item: Arc<Item> = item.into();
        let source = item.source().clone();

        let index = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            items.push(item);
            items.len() - 1
        };

        tracing::debug!(index, source = %source, "item appended");
        self.notify(StoreEvent::ContentAdded { index, source });
    }

    /// Register `listener` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let listener: ListenerFn = Arc::new(listener);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, listener)
    }

    /// Remove a registration. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .count(kind)
    }

    pub(crate) fn dispatcher(&self) -> Arc<dyn Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    fn notify(&self, event: StoreEvent) {
        let handlers = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers(event.kind());
        if handlers.is_empty() {
            return;
        }

        self.dispatcher.dispatch(Box::new(move || {
            for handler in &handlers {
                handler(&event);
            }
        }));
    }
}

impl fmt::Debug for ConcurrentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;
    use crate::impls::{ChannelDispatcher, InlineDispatcher};
    use std::sync::Mutex;

    fn store() -> ConcurrentStore {
        ConcurrentStore::new(Arc::new(InlineDispatcher))
    }

    fn item(name: &str) -> Item {
        Item::new(Source::new(name), name.as_bytes().to_vec())
    }

    #[test]
    fn new_store_is_empty() {
        let store = store();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn append_keeps_insertion_order() {
        let store = store();
        store.append(item("a"));
        store.append(item("b"));
        store.append(item("c"));

        let names: Vec<_> = store
            .snapshot()
            .iter()
            .map(|i| i.source().as_str().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn snapshot_is_detached_from_later_appends() {
        let store = store();
        store.append(item("a"));
        let before = store.snapshot();
        store.append(item("b"));

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn listener_receives_index_and_source() {
        let store = store();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(EventKind::ContentAdded, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        store.append(item("a"));
        store.append(item("b"));

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                StoreEvent::ContentAdded {
                    index: 0,
                    source: Source::new("a")
                },
                StoreEvent::ContentAdded {
                    index: 1,
                    source: Source::new("b")
                },
            ]
        );
    }

    #[test]
    fn listener_can_read_the_store_it_observes() {
        let store = Arc::new(store());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = Arc::clone(&store);
        let sink = Arc::clone(&observed);
        store.subscribe(EventKind::ContentAdded, move |_| {
            // Runs inline on the appending thread; would deadlock if the
            // write lock were still held.
            sink.lock().unwrap().push(reader.snapshot().len());
        });

        store.append(item("a"));
        store.append(item("b"));

        assert_eq!(*observed.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let store = store();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(EventKind::ContentAdded, move |_| {
            *counter.lock().unwrap() += 1;
        });

        store.append(item("a"));
        assert!(store.unsubscribe(id));
        store.append(item("b"));

        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(store.listener_count(EventKind::ContentAdded), 0);
    }

    #[test]
    fn concurrent_appends_are_neither_lost_nor_duplicated() {
        let store = Arc::new(store());
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append(item(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 400);
        let unique: std::collections::HashSet<_> =
            snapshot.iter().map(|i| i.source().clone()).collect();
        assert_eq!(unique.len(), 400);
    }

    #[test]
    fn queued_events_cover_every_index_once() {
        let (dispatcher, mut events) = ChannelDispatcher::new();
        let store = Arc::new(ConcurrentStore::new(Arc::new(dispatcher)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(EventKind::ContentAdded, move |event| {
            let StoreEvent::ContentAdded { index, source } = event;
            sink.lock().unwrap().push((*index, source.clone()));
        });

        let threads: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.append(item(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(events.run_pending(), 100);

        // Delivery order may differ from index order; each index names the
        // item stored at that position.
        let snapshot = store.snapshot();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort_by_key(|(index, _)| *index);
        assert_eq!(seen.len(), 100);
        for (expected, (index, source)) in seen.iter().enumerate() {
            assert_eq!(*index, expected);
            assert_eq!(snapshot[*index].source(), source);
        }
    }

    #[test]
    fn append_accepts_a_shared_item_without_copying() {
        let store = store();
        let shared = Arc::new(item("a"));
        store.append(Arc::clone(&shared));
        assert!(Arc::ptr_eq(&store.snapshot()[0], &shared));
    }
}
