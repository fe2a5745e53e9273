// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recency-ordered conversation list.
//!
//! Index 0 is always the most recently active conversation. Events that
//! update a conversation's `last_message` promote it to the front while
//! preserving the relative order of everything else. Read receipts update
//! in place without reordering.

use chrono::{DateTime, Utc};
use tracing::debug;

use trimly_core::types::{Conversation, ConversationId, LastMessage, MessageId, UserId};

/// In-memory conversation summaries, sorted by recency.
#[derive(Debug, Default)]
pub struct ConversationStore {
    items: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Replace the entire list from a snapshot, in payload order.
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        debug!(count = conversations.len(), "conversation store replaced from snapshot");
        self.items = conversations;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.items.iter().find(|c| c.id == *id)
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.get(id).is_some()
    }

    /// Snapshot of the current recency order.
    pub fn list(&self) -> Vec<Conversation> {
        self.items.clone()
    }

    /// Insert or replace a conversation at the front of the recency order.
    ///
    /// An existing conversation with the same id is removed first so the
    /// relative order of all other conversations is preserved.
    pub fn upsert_front(&mut self, conversation: Conversation) {
        if let Some(pos) = self.items.iter().position(|c| c.id == conversation.id) {
            self.items.remove(pos);
        }
        self.items.insert(0, conversation);
    }

    /// Update `last_message` for a conversation and promote it to index 0.
    ///
    /// Returns false if the conversation is unknown (the caller decides
    /// whether that is the documented `order`-event gap or an upsert).
    pub fn touch(&mut self, id: &ConversationId, last_message: LastMessage) -> bool {
        let Some(pos) = self.items.iter().position(|c| c.id == *id) else {
            return false;
        };
        let mut conversation = self.items.remove(pos);
        conversation.last_message = Some(last_message);
        self.items.insert(0, conversation);
        true
    }

    /// Apply a read receipt to the conversation's `last_message`, if it is
    /// the receipted message. Idempotent per reader; does not reorder.
    pub fn apply_read_receipt(
        &mut self,
        id: &ConversationId,
        message_id: &MessageId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> bool {
        let Some(conversation) = self.items.iter_mut().find(|c| c.id == *id) else {
            return false;
        };
        let Some(last) = conversation.last_message.as_mut() else {
            return false;
        };
        if last.id != *message_id {
            return false;
        }
        if last.read_by.iter().any(|e| e.user_id == reader) {
            return false;
        }
        last.read_by.push(trimly_core::types::ReadEntry {
            user_id: reader,
            read_at,
        });
        true
    }

    /// Drop all conversations (session teardown).
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
