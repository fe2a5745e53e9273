// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary contact placeholders.
//!
//! When a conversation is started locally, the chat screen needs a name and
//! avatar before the server snapshot confirms the conversation exists. The
//! placeholder is dropped as soon as a real conversation with the same id
//! lands in the conversation store.

use std::collections::HashMap;

use tracing::debug;

use trimly_core::types::{ConversationId, TempContact};

/// Conversation-id-keyed contact placeholders.
#[derive(Debug, Default)]
pub struct TempContacts {
    map: HashMap<ConversationId, TempContact>,
}

impl TempContacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a placeholder for a locally-started conversation.
    pub fn insert(&mut self, contact: TempContact) {
        self.map.insert(contact.conversation_id.clone(), contact);
    }

    pub fn get(&self, conversation_id: &ConversationId) -> Option<&TempContact> {
        self.map.get(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop placeholders whose conversation is now confirmed.
    ///
    /// `confirmed` reports whether the conversation store knows the id.
    pub fn prune_confirmed(&mut self, confirmed: impl Fn(&ConversationId) -> bool) {
        let before = self.map.len();
        self.map.retain(|id, _| !confirmed(id));
        let dropped = before - self.map.len();
        if dropped > 0 {
            debug!(count = dropped, "temporary contacts cleared by confirmed conversations");
        }
    }

    /// Drop everything (session teardown).
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimly_core::types::UserId;

    fn contact(conv: &str, user: &str) -> TempContact {
        TempContact {
            conversation_id: ConversationId(conv.to_string()),
            user_id: UserId(user.to_string()),
            name: "Pending Stylist".to_string(),
            avatar_url: None,
        }
    }

    #[test]
    fn insert_and_get() {
        let mut contacts = TempContacts::new();
        contacts.insert(contact("c1", "u2"));
        assert_eq!(
            contacts.get(&ConversationId("c1".to_string())).unwrap().name,
            "Pending Stylist"
        );
    }

    #[test]
    fn prune_removes_only_confirmed_ids() {
        let mut contacts = TempContacts::new();
        contacts.insert(contact("c1", "u2"));
        contacts.insert(contact("c2", "u3"));

        contacts.prune_confirmed(|id| id.0 == "c1");

        assert!(contacts.get(&ConversationId("c1".to_string())).is_none());
        assert!(contacts.get(&ConversationId("c2".to_string())).is_some());
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn reinsert_overwrites_placeholder() {
        let mut contacts = TempContacts::new();
        contacts.insert(contact("c1", "u2"));
        let mut updated = contact("c1", "u2");
        updated.name = "Ana".to_string();
        contacts.insert(updated);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts.get(&ConversationId("c1".to_string())).unwrap().name, "Ana");
    }
}
