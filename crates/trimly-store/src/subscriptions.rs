// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listener registry for store changes.
//!
//! Screens subscribe per conversation id; conversation-list screens
//! subscribe to the `"all"` sentinel and receive every change. Callbacks
//! are invoked synchronously in insertion order and must not block; the
//! registry clones the callback list before invoking so a callback may
//! subscribe or unsubscribe without deadlocking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use trimly_core::types::ConversationId;

/// What changed in the store, delivered to subscribers. UI re-renders from
/// store state; the change itself only says where to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub conversation_id: ConversationId,
    pub kind: ChangeKind,
}

/// Category of store change, for listeners that filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The bulk snapshot replaced all state.
    Snapshot,
    /// Confirmed message(s) appended (text/file/audio/video/order).
    Message,
    /// A read receipt was applied.
    ReadReceipt,
    /// The typing set for the conversation changed.
    Typing,
    /// Connection state changed (error flag, loading).
    Connection,
}

/// Handle returned by `subscribe`, usable for targeted removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(uuid::Uuid);

/// A registered listener callback.
pub type StoreListener = Arc<dyn Fn(&StoreChange) + Send + Sync>;

/// Per-conversation listener lists plus the `"all"` sentinel.
#[derive(Default)]
pub struct SubscriptionRegistry {
    listeners: Mutex<HashMap<ConversationId, Vec<(SubscriptionId, StoreListener)>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one conversation id (or the `"all"` sentinel).
    pub fn subscribe(&self, conversation_id: ConversationId, listener: StoreListener) -> SubscriptionId {
        let id = SubscriptionId(uuid::Uuid::new_v4());
        self.lock().entry(conversation_id).or_default().push((id, listener));
        id
    }

    /// Remove every callback registered for a conversation id.
    pub fn unsubscribe(&self, conversation_id: &ConversationId) -> usize {
        self.lock().remove(conversation_id).map_or(0, |list| list.len())
    }

    /// Remove a single callback by its handle.
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        let mut map = self.lock();
        for list in map.values_mut() {
            if let Some(pos) = list.iter().position(|(sub, _)| *sub == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of live subscriptions across all conversation ids.
    pub fn len(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify listeners for the change's conversation, then the sentinel.
    ///
    /// Listeners run synchronously in insertion order. The sentinel list is
    /// not invoked twice when the change itself targets the sentinel.
    pub fn notify(&self, change: &StoreChange) {
        let all = ConversationId::all();
        let targets = {
            let map = self.lock();
            let mut targets: Vec<StoreListener> = Vec::new();
            if let Some(list) = map.get(&change.conversation_id) {
                targets.extend(list.iter().map(|(_, cb)| Arc::clone(cb)));
            }
            if change.conversation_id != all {
                if let Some(list) = map.get(&all) {
                    targets.extend(list.iter().map(|(_, cb)| Arc::clone(cb)));
                }
            }
            targets
        };

        trace!(
            conversation_id = %change.conversation_id,
            listeners = targets.len(),
            "store change dispatched"
        );
        for listener in targets {
            listener(change);
        }
    }

    /// Drop all subscriptions (session teardown).
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<ConversationId, Vec<(SubscriptionId, StoreListener)>>>
    {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cid(id: &str) -> ConversationId {
        ConversationId(id.to_string())
    }

    fn change(id: &str) -> StoreChange {
        StoreChange {
            conversation_id: cid(id),
            kind: ChangeKind::Message,
        }
    }

    fn counting_listener(counter: &Arc<AtomicUsize>) -> StoreListener {
        let counter = Arc::clone(counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn specific_and_sentinel_listeners_both_fire() {
        let registry = SubscriptionRegistry::new();
        let specific = Arc::new(AtomicUsize::new(0));
        let sentinel = Arc::new(AtomicUsize::new(0));

        registry.subscribe(cid("c1"), counting_listener(&specific));
        registry.subscribe(ConversationId::all(), counting_listener(&sentinel));

        registry.notify(&change("c1"));
        assert_eq!(specific.load(Ordering::SeqCst), 1);
        assert_eq!(sentinel.load(Ordering::SeqCst), 1);

        // A change for another conversation reaches only the sentinel.
        registry.notify(&change("c2"));
        assert_eq!(specific.load(Ordering::SeqCst), 1);
        assert_eq!(sentinel.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sentinel_change_does_not_double_fire() {
        let registry = SubscriptionRegistry::new();
        let sentinel = Arc::new(AtomicUsize::new(0));
        registry.subscribe(ConversationId::all(), counting_listener(&sentinel));

        registry.notify(&StoreChange {
            conversation_id: ConversationId::all(),
            kind: ChangeKind::Snapshot,
        });
        assert_eq!(sentinel.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn multiple_listeners_fire_in_insertion_order() {
        let registry = SubscriptionRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.subscribe(
                cid("c1"),
                Arc::new(move |_| order.lock().unwrap().push(tag)),
            );
        }

        registry.notify(&change("c1"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribe_removes_all_for_conversation() {
        let registry = SubscriptionRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.subscribe(cid("c1"), counting_listener(&counter));
        registry.subscribe(cid("c1"), counting_listener(&counter));

        assert_eq!(registry.unsubscribe(&cid("c1")), 2);
        registry.notify(&change("c1"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_id_removes_single_listener() {
        let registry = SubscriptionRegistry::new();
        let kept = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));

        registry.subscribe(cid("c1"), counting_listener(&kept));
        let id = registry.subscribe(cid("c1"), counting_listener(&dropped));

        assert!(registry.unsubscribe_id(id));
        assert!(!registry.unsubscribe_id(id));

        registry.notify(&change("c1"));
        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_subscribe_during_notify() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let registry_clone = Arc::clone(&registry);

        registry.subscribe(
            cid("c1"),
            Arc::new(move |_| {
                registry_clone.subscribe(cid("c1"), Arc::new(|_| {}));
            }),
        );

        // Must not deadlock.
        registry.notify(&change("c1"));
        assert_eq!(registry.len(), 2);
    }
}
