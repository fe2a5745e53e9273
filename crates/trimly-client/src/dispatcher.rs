// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes inbound envelopes into the stores and notifies subscribers.
//!
//! `handle()` is the single entry point for every frame the socket
//! delivers. Events are processed in delivery order; each one mutates the
//! stores under the session lock and then fans out a [`StoreChange`] to
//! the conversation's listeners and the `"all"` sentinel. Nothing in here
//! returns an error to the read loop: malformed payloads, unknown event
//! types, and self-typing are logged and skipped.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use trimly_core::envelope::{
    Envelope, EventKind, MessagePayload, ReadReceiptPayload, SnapshotPayload, TypingPayload,
};
use trimly_core::types::{ConversationId, UserId};
use trimly_store::{
    ChangeKind, ChatStore, StoreChange, SubscriptionRegistry, TypingTracker,
};

use crate::connection::ConnectionStatus;

/// Decodes inbound envelopes by kind and applies them to the stores.
pub struct EventDispatcher {
    me: UserId,
    store: Arc<Mutex<ChatStore>>,
    subscriptions: Arc<SubscriptionRegistry>,
    typing: TypingTracker,
    status: watch::Sender<ConnectionStatus>,
}

impl EventDispatcher {
    /// Build a dispatcher for the given user identity.
    ///
    /// The typing tracker's expiry path notifies the same subscription
    /// registry an explicit `stop_typing` would.
    pub fn new(
        me: UserId,
        store: Arc<Mutex<ChatStore>>,
        subscriptions: Arc<SubscriptionRegistry>,
        typing_expiry: std::time::Duration,
        status: watch::Sender<ConnectionStatus>,
    ) -> Self {
        let subs_for_expiry = Arc::clone(&subscriptions);
        let typing = TypingTracker::new(
            typing_expiry,
            Arc::new(move |conversation_id| {
                subs_for_expiry.notify(&StoreChange {
                    conversation_id,
                    kind: ChangeKind::Typing,
                });
            }),
        );

        Self {
            me,
            store,
            subscriptions,
            typing,
            status,
        }
    }

    /// The typing tracker (read access for screens, teardown for the session).
    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Apply one inbound envelope. Never fails; bad input is logged.
    pub async fn handle(&self, envelope: Envelope) {
        match &envelope.kind {
            EventKind::AllConversations => self.on_snapshot(&envelope).await,
            EventKind::Text
            | EventKind::File
            | EventKind::Audio
            | EventKind::Video
            | EventKind::Order => self.on_message(&envelope).await,
            EventKind::ReadReceipt => self.on_read_receipt(&envelope).await,
            EventKind::Typing => self.on_typing(&envelope, true),
            EventKind::StopTyping => self.on_typing(&envelope, false),
            EventKind::Unknown(raw) => {
                debug!(kind = %raw, "unknown event type ignored");
            }
        }
    }

    async fn on_snapshot(&self, envelope: &Envelope) {
        let Some(payload) = decode::<SnapshotPayload>(envelope) else {
            return;
        };

        let count = payload.conversations.len();
        self.store.lock().await.apply_snapshot(payload.conversations);
        // The snapshot answers the request sent on open: loading is over.
        self.status.send_modify(|s| s.loading = false);
        debug!(conversations = count, "snapshot event applied");

        self.notify(ConversationId::all(), ChangeKind::Snapshot);
    }

    async fn on_message(&self, envelope: &Envelope) {
        let Some(payload) = decode::<MessagePayload>(envelope) else {
            return;
        };

        let conversation = payload.conversation.clone();
        let messages = payload.into_messages();
        if messages.is_empty() {
            debug!(
                conversation_id = %envelope.conversation_id,
                "message event with no messages skipped"
            );
            return;
        }

        let applied = self.store.lock().await.apply_message_event(
            &envelope.conversation_id,
            conversation,
            messages,
            Utc::now(),
        );
        debug!(
            conversation_id = %envelope.conversation_id,
            reconciled = applied.reconciled,
            conversation_updated = applied.conversation_updated,
            "message event applied"
        );

        self.notify(envelope.conversation_id.clone(), ChangeKind::Message);
    }

    async fn on_read_receipt(&self, envelope: &Envelope) {
        let Some(payload) = decode::<ReadReceiptPayload>(envelope) else {
            return;
        };

        let changed = self.store.lock().await.apply_read_receipt(
            &envelope.conversation_id,
            &payload.message_id,
            envelope.sender_id.clone(),
            envelope.timestamp,
        );

        if changed {
            self.notify(envelope.conversation_id.clone(), ChangeKind::ReadReceipt);
        }
    }

    fn on_typing(&self, envelope: &Envelope, is_typing: bool) {
        // A sender must never see their own typing indicator.
        if envelope.sender_id == self.me {
            return;
        }
        let Some(payload) = decode::<TypingPayload>(envelope) else {
            return;
        };
        if payload.user_id == self.me {
            return;
        }

        let changed = if is_typing {
            self.typing.note_typing(
                envelope.conversation_id.clone(),
                payload.user_id,
                &payload.user_name,
            );
            true
        } else {
            self.typing
                .note_stop_typing(&envelope.conversation_id, &payload.user_id)
        };

        if changed {
            self.notify(envelope.conversation_id.clone(), ChangeKind::Typing);
        }
    }

    fn notify(&self, conversation_id: ConversationId, kind: ChangeKind) {
        self.subscriptions.notify(&StoreChange {
            conversation_id,
            kind,
        });
    }
}

/// Decode an envelope's `data` into the payload type for its kind.
///
/// Null data and malformed payloads are skipped with a log line; the
/// dispatcher must never crash on a bad frame.
fn decode<T: DeserializeOwned>(envelope: &Envelope) -> Option<T> {
    let Some(data) = envelope.data.clone() else {
        debug!(
            kind = %envelope.kind,
            conversation_id = %envelope.conversation_id,
            "event with null data skipped"
        );
        return None;
    };
    match serde_json::from_value(data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(
                kind = %envelope.kind,
                conversation_id = %envelope.conversation_id,
                error = %e,
                "malformed event payload skipped"
            );
            None
        }
    }
}
