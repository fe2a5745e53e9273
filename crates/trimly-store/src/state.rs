// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The combined in-memory chat state one session owns.
//!
//! All mutation goes through the dispatcher while holding the session's
//! single lock, so the aggregate itself is plain data with synchronous
//! methods. It is created by `ChatSession::init` and dropped wholesale on
//! `dispose` or identity change; nothing here survives a reconnect except
//! by being rebuilt from the `all_conversations` snapshot.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use trimly_core::envelope::SnapshotEntry;
use trimly_core::types::{
    Conversation, ConversationId, LastMessage, Message, MessageId, TempContact, UserId,
};

use crate::contacts::TempContacts;
use crate::conversations::ConversationStore;
use crate::messages::MessageStore;

/// Outcome of applying a message-bearing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageApplied {
    /// Optimistic entries reconciled away by the confirmed messages.
    pub reconciled: usize,
    /// Whether the conversation list was updated (false for the documented
    /// unknown-conversation gap on `order` events).
    pub conversation_updated: bool,
}

/// Conversation, message, and temporary-contact state for one session.
#[derive(Debug)]
pub struct ChatStore {
    pub conversations: ConversationStore,
    pub messages: MessageStore,
    pub contacts: TempContacts,
}

impl ChatStore {
    /// Create empty state with the given reconciliation window.
    pub fn new(reconcile_window: Duration) -> Self {
        Self {
            conversations: ConversationStore::new(),
            messages: MessageStore::new(reconcile_window),
            contacts: TempContacts::new(),
        }
    }

    /// Replace all state from the bulk snapshot.
    ///
    /// Null/missing message arrays are empty lists, not errors.
    pub fn apply_snapshot(&mut self, entries: Vec<SnapshotEntry>) {
        let mut conversations = Vec::with_capacity(entries.len());
        let mut lists = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = entry.conversation.id.clone();
            lists.push((id, entry.messages.unwrap_or_default()));
            conversations.push(entry.conversation);
        }

        self.conversations.replace_all(conversations);
        self.messages.replace_all(lists);
        self.contacts
            .prune_confirmed(|id| self.conversations.contains(id));
        debug!(count = self.conversations.len(), "snapshot applied");
    }

    /// Apply confirmed message(s) for one conversation: upsert the
    /// conversation to the front of the recency order, then append the
    /// messages, reconciling optimistic placeholders still in the window.
    pub fn apply_message_event(
        &mut self,
        conversation_id: &ConversationId,
        payload_conversation: Option<Conversation>,
        confirmed: Vec<Message>,
        now: DateTime<Utc>,
    ) -> MessageApplied {
        if confirmed.is_empty() {
            return MessageApplied {
                reconciled: 0,
                conversation_updated: false,
            };
        }

        // Non-empty, checked above.
        let Some(last) = confirmed.last().map(LastMessage::from) else {
            return MessageApplied {
                reconciled: 0,
                conversation_updated: false,
            };
        };

        let conversation_updated = if self.conversations.touch(conversation_id, last.clone()) {
            true
        } else if let Some(mut conversation) = payload_conversation {
            conversation.last_message = Some(last);
            self.conversations.upsert_front(conversation);
            self.contacts
                .prune_confirmed(|id| self.conversations.contains(id));
            true
        } else {
            // Known gap: the event carries no conversation object, so the
            // list cannot learn about it yet.
            warn!(
                conversation_id = %conversation_id,
                "conversation unknown and event carried none; list update dropped"
            );
            false
        };

        let reconciled = self.messages.append_confirmed(conversation_id, confirmed, now);

        MessageApplied {
            reconciled,
            conversation_updated,
        }
    }

    /// Append an optimistic local message and promote its conversation.
    pub fn add_optimistic(&mut self, message: Message) {
        let last = LastMessage::from(&message);
        let conversation_id = message.conversation_id.clone();
        self.messages.add_optimistic(message);
        if !self.conversations.touch(&conversation_id, last.clone()) {
            // Locally-started conversation the snapshot has not confirmed:
            // show it at the front with just the optimistic summary.
            let conversation = Conversation {
                id: conversation_id,
                participants: Vec::new(),
                last_message: Some(last),
            };
            self.conversations.upsert_front(conversation);
        }
    }

    /// Register a placeholder contact for a locally-started conversation.
    pub fn add_temp_contact(&mut self, contact: TempContact) {
        if self.conversations.contains(&contact.conversation_id) {
            return;
        }
        self.contacts.insert(contact);
    }

    /// Apply a read receipt in both stores. Returns true if either changed.
    pub fn apply_read_receipt(
        &mut self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> bool {
        let message_changed = self.messages.apply_read_receipt(
            conversation_id,
            message_id,
            reader.clone(),
            read_at,
        );
        let summary_changed =
            self.conversations
                .apply_read_receipt(conversation_id, message_id, reader, read_at);
        message_changed || summary_changed
    }

    /// Drop everything (dispose / identity change).
    pub fn clear(&mut self) {
        self.conversations.clear();
        self.messages.clear();
        self.contacts.clear();
    }
}
