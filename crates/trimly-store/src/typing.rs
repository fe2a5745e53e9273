// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral per-conversation typing indicators with auto-expiry.
//!
//! Each `(conversation, user)` pair gets its own expiry task; a fresh
//! `typing` event restarts it, an explicit `stop_typing` cancels it, and
//! expiry covers clients that disconnect without sending one. The expected
//! scale is two participants per conversation, so a per-key task map is
//! deliberately used instead of a shared timer wheel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use trimly_core::types::{ConversationId, TypingEntry, UserId};

/// Callback invoked when a typing entry expires on its own, so the owner
/// can notify subscribers the same way an explicit stop would.
pub type ExpiryNotifier = Arc<dyn Fn(ConversationId) + Send + Sync>;

struct TypingSlot {
    user_name: String,
    timer: JoinHandle<()>,
}

/// Tracks who is currently typing in which conversation.
pub struct TypingTracker {
    expiry: Duration,
    notifier: ExpiryNotifier,
    slots: Arc<Mutex<HashMap<(ConversationId, UserId), TypingSlot>>>,
}

impl TypingTracker {
    /// Create a tracker with the given auto-expiry and expiry callback.
    pub fn new(expiry: Duration, notifier: ExpiryNotifier) -> Self {
        Self {
            expiry,
            notifier,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record that a user is typing, (re)starting their expiry timer.
    pub fn note_typing(&self, conversation_id: ConversationId, user_id: UserId, user_name: &str) {
        let key = (conversation_id.clone(), user_id.clone());

        let timer = {
            let slots = Arc::clone(&self.slots);
            let notifier = Arc::clone(&self.notifier);
            let expiry = self.expiry;
            let key = key.clone();
            tokio::spawn(async move {
                tokio::time::sleep(expiry).await;
                let removed = {
                    let mut map = match slots.lock() {
                        Ok(map) => map,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    map.remove(&key).is_some()
                };
                if removed {
                    debug!(
                        conversation_id = %key.0,
                        user_id = %key.1,
                        "typing indicator expired"
                    );
                    notifier(key.0);
                }
            })
        };

        let mut map = self.lock_slots();
        if let Some(previous) = map.insert(
            key,
            TypingSlot {
                user_name: user_name.to_string(),
                timer,
            },
        ) {
            previous.timer.abort();
        } else {
            debug!(conversation_id = %conversation_id, user_id = %user_id, "typing started");
        }
    }

    /// Remove a typing entry immediately and cancel its timer.
    ///
    /// Returns false if the user was not marked as typing.
    pub fn note_stop_typing(&self, conversation_id: &ConversationId, user_id: &UserId) -> bool {
        let key = (conversation_id.clone(), user_id.clone());
        let removed = self.lock_slots().remove(&key);
        match removed {
            Some(slot) => {
                slot.timer.abort();
                debug!(conversation_id = %conversation_id, user_id = %user_id, "typing stopped");
                true
            }
            None => false,
        }
    }

    /// Users currently typing in one conversation.
    pub fn typing_users(&self, conversation_id: &ConversationId) -> Vec<TypingEntry> {
        self.lock_slots()
            .iter()
            .filter(|((cid, _), _)| cid == conversation_id)
            .map(|((cid, uid), slot)| TypingEntry {
                conversation_id: cid.clone(),
                user_id: uid.clone(),
                user_name: slot.user_name.clone(),
            })
            .collect()
    }

    /// Total typing entries across conversations.
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_slots().is_empty()
    }

    /// Cancel every pending expiry timer and drop all entries (teardown).
    pub fn clear(&self) {
        let mut map = self.lock_slots();
        for (_, slot) in map.drain() {
            slot.timer.abort();
        }
    }

    fn lock_slots(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(ConversationId, UserId), TypingSlot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for TypingTracker {
    fn drop(&mut self) {
        self.clear();
    }
}
