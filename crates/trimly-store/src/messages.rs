// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation message lists with optimistic reconciliation.
//!
//! Messages are kept in arrival/creation order. An optimistic entry is
//! replaced by a server-confirmed message from the same sender with the
//! same kind if the echo arrives within the reconciliation window; after
//! the window expires the optimistic entry is left in place. This is the
//! time-window heuristic the backend contract currently requires -- there
//! is no idempotency key to match on.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use trimly_core::types::{ConversationId, Message, MessageId, UserId};

/// In-memory map of conversation id to ordered message list.
#[derive(Debug)]
pub struct MessageStore {
    window: chrono::Duration,
    by_conversation: HashMap<ConversationId, Vec<Message>>,
}

impl MessageStore {
    /// Create a store with the given optimistic-reconciliation window.
    pub fn new(window: Duration) -> Self {
        Self {
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::seconds(5)),
            by_conversation: HashMap::new(),
        }
    }

    /// Replace all message lists from a snapshot.
    pub fn replace_all(&mut self, lists: Vec<(ConversationId, Vec<Message>)>) {
        self.by_conversation = lists.into_iter().collect();
    }

    /// Messages for one conversation, empty if none are known.
    pub fn messages(&self, id: &ConversationId) -> &[Message] {
        self.by_conversation.get(id).map_or(&[], Vec::as_slice)
    }

    /// Append a locally-synthesized message before any network confirmation.
    pub fn add_optimistic(&mut self, message: Message) {
        debug!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            "optimistic message appended"
        );
        self.by_conversation
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
    }

    /// Append server-confirmed messages, dropping any optimistic entry from
    /// the same sender with the same kind that is still inside the
    /// reconciliation window at `now`.
    ///
    /// Returns the number of optimistic entries reconciled away.
    pub fn append_confirmed(
        &mut self,
        conversation_id: &ConversationId,
        confirmed: Vec<Message>,
        now: DateTime<Utc>,
    ) -> usize {
        let list = self.by_conversation.entry(conversation_id.clone()).or_default();
        let mut reconciled = 0;

        for message in confirmed {
            if list.iter().any(|m| m.id == message.id) {
                warn!(
                    conversation_id = %conversation_id,
                    message_id = %message.id,
                    "duplicate confirmed message dropped"
                );
                continue;
            }

            let window = self.window;
            let before = list.len();
            list.retain(|existing| {
                let stale = existing.optimistic
                    && existing.sender_id == message.sender_id
                    && existing.kind == message.kind
                    && now.signed_duration_since(existing.created_at) <= window;
                !stale
            });
            reconciled += before - list.len();

            list.push(message);
        }

        if reconciled > 0 {
            debug!(
                conversation_id = %conversation_id,
                count = reconciled,
                "optimistic messages reconciled"
            );
        }
        reconciled
    }

    /// Apply a read receipt to a message by id. Idempotent per reader.
    pub fn apply_read_receipt(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> bool {
        let Some(list) = self.by_conversation.get_mut(conversation_id) else {
            return false;
        };
        let Some(message) = list.iter_mut().find(|m| m.id == *message_id) else {
            return false;
        };
        message.mark_read_by(reader, read_at)
    }

    /// Drop all message lists (session teardown).
    pub fn clear(&mut self) {
        self.by_conversation.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trimly_core::types::MessageKind;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn cid() -> ConversationId {
        ConversationId("c1".to_string())
    }

    fn confirmed(id: &str, sender: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: MessageId(id.to_string()),
            conversation_id: cid(),
            sender_id: UserId(sender.to_string()),
            kind: MessageKind::Text,
            content: "hello".to_string(),
            file_url: None,
            file_name: None,
            order: None,
            created_at: at,
            delivered_at: Some(at),
            updated_at: None,
            read_by: Vec::new(),
            metadata: None,
            optimistic: false,
        }
    }

    fn optimistic(sender: &str, at: DateTime<Utc>) -> Message {
        Message::optimistic(cid(), UserId(sender.to_string()), MessageKind::Text, "hello", at)
    }

    #[test]
    fn echo_inside_window_replaces_optimistic() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));

        // Confirmed echo 4 seconds later: exactly one message remains.
        let reconciled =
            store.append_confirmed(&cid(), vec![confirmed("srv-1", "u1", ts(104))], ts(104));
        assert_eq!(reconciled, 1);

        let list = store.messages(&cid());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id.0, "srv-1");
        assert!(!list[0].optimistic);
    }

    #[test]
    fn echo_after_window_leaves_both() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));

        // Echo 6 seconds later: window expired, both entries remain.
        let reconciled =
            store.append_confirmed(&cid(), vec![confirmed("srv-1", "u1", ts(106))], ts(106));
        assert_eq!(reconciled, 0);
        assert_eq!(store.messages(&cid()).len(), 2);
    }

    #[test]
    fn echo_from_other_sender_does_not_reconcile() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));

        store.append_confirmed(&cid(), vec![confirmed("srv-1", "u2", ts(101))], ts(101));
        assert_eq!(store.messages(&cid()).len(), 2);
    }

    #[test]
    fn echo_with_different_kind_does_not_reconcile() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));

        let mut file_msg = confirmed("srv-1", "u1", ts(101));
        file_msg.kind = MessageKind::File;
        store.append_confirmed(&cid(), vec![file_msg], ts(101));
        assert_eq!(store.messages(&cid()).len(), 2);
    }

    #[test]
    fn confirmed_messages_keep_arrival_order() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.append_confirmed(&cid(), vec![confirmed("m1", "u1", ts(100))], ts(100));
        store.append_confirmed(&cid(), vec![confirmed("m2", "u2", ts(101))], ts(101));
        store.append_confirmed(&cid(), vec![confirmed("m3", "u1", ts(102))], ts(102));

        // m3 reconciles nothing (no optimistic entries) and lands last.
        let ids: Vec<String> = store.messages(&cid()).iter().map(|m| m.id.0.clone()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn duplicate_confirmed_id_is_dropped() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.append_confirmed(&cid(), vec![confirmed("m1", "u1", ts(100))], ts(100));
        store.append_confirmed(&cid(), vec![confirmed("m1", "u1", ts(100))], ts(100));
        assert_eq!(store.messages(&cid()).len(), 1);
    }

    #[test]
    fn read_receipt_idempotent() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.append_confirmed(&cid(), vec![confirmed("m1", "u1", ts(100))], ts(100));

        assert!(store.apply_read_receipt(
            &cid(),
            &MessageId("m1".to_string()),
            UserId("u2".to_string()),
            ts(101),
        ));
        assert!(!store.apply_read_receipt(
            &cid(),
            &MessageId("m1".to_string()),
            UserId("u2".to_string()),
            ts(102),
        ));
        assert_eq!(store.messages(&cid())[0].read_by.len(), 1);
    }

    #[test]
    fn read_receipt_for_unknown_message_is_noop() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        assert!(!store.apply_read_receipt(
            &cid(),
            &MessageId("nope".to_string()),
            UserId("u2".to_string()),
            ts(101),
        ));
    }

    #[test]
    fn snapshot_replaces_all_lists() {
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));

        let other = ConversationId("c2".to_string());
        store.replace_all(vec![(other.clone(), vec![confirmed("m1", "u1", ts(50))])]);

        assert!(store.messages(&cid()).is_empty());
        assert_eq!(store.messages(&other).len(), 1);
    }

    #[test]
    fn rapid_double_send_reconciles_one_per_echo() {
        // Two optimistic sends inside the window; each echo removes all
        // matching optimistic entries still inside the window -- the first
        // echo merges both. Documented behavior of the heuristic.
        let mut store = MessageStore::new(Duration::from_secs(5));
        store.add_optimistic(optimistic("u1", ts(100)));
        store.add_optimistic(optimistic("u1", ts(101)));

        let reconciled =
            store.append_confirmed(&cid(), vec![confirmed("srv-1", "u1", ts(102))], ts(102));
        assert_eq!(reconciled, 2);
        assert_eq!(store.messages(&cid()).len(), 1);
    }
}
