// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session facade screens talk to.
//!
//! One `ChatSession` per authenticated identity: `init` builds the stores
//! and dials the socket, `dispose` tears everything down. When the signed
//! in user changes, the old session is disposed and a fresh one
//! initialized -- no state survives an identity change.
//!
//! Sends are optimistic: the local entry is appended and subscribers are
//! notified before the REST call is made. A failed REST send surfaces as
//! an `Err` to the calling screen and deliberately does not roll the
//! optimistic entry back; only the socket echo reconciles it.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::debug;

use trimly_core::config::ChatConfig;
use trimly_core::envelope::Envelope;
use trimly_core::error::ChatError;
use trimly_core::traits::{Attachment, ChatApi, SendMessageRequest, SocketTransport};
use trimly_core::types::{
    Conversation, ConversationId, Message, MessageId, MessageKind, TempContact, TypingEntry,
    UserId,
};
use trimly_store::{
    ChangeKind, ChatStore, StoreChange, StoreListener, SubscriptionId, SubscriptionRegistry,
};

use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::dispatcher::EventDispatcher;

/// Process-wide chat state and socket lifecycle for one signed-in user.
pub struct ChatSession {
    user_id: UserId,
    user_name: String,
    store: Arc<Mutex<ChatStore>>,
    subscriptions: Arc<SubscriptionRegistry>,
    dispatcher: Arc<EventDispatcher>,
    connection: ConnectionManager,
    api: Arc<dyn ChatApi>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl ChatSession {
    /// Build a session without connecting. Screens normally use [`init`];
    /// this constructor exists so tests can drive the lifecycle manually.
    ///
    /// [`init`]: ChatSession::init
    pub fn new(
        config: &ChatConfig,
        user_id: UserId,
        user_name: impl Into<String>,
        transport: Arc<dyn SocketTransport>,
        api: Arc<dyn ChatApi>,
    ) -> Self {
        let store = Arc::new(Mutex::new(ChatStore::new(config.reconcile_window())));
        let subscriptions = Arc::new(SubscriptionRegistry::new());
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());

        let dispatcher = Arc::new(EventDispatcher::new(
            user_id.clone(),
            Arc::clone(&store),
            Arc::clone(&subscriptions),
            config.typing_expiry(),
            status_tx.clone(),
        ));
        let connection = ConnectionManager::new(transport, Arc::clone(&dispatcher), status_tx);

        Self {
            user_id,
            user_name: user_name.into(),
            store,
            subscriptions,
            dispatcher,
            connection,
            api,
            status_rx,
        }
    }

    /// Build a session and connect its socket.
    pub async fn init(
        config: &ChatConfig,
        user_id: UserId,
        user_name: impl Into<String>,
        transport: Arc<dyn SocketTransport>,
        api: Arc<dyn ChatApi>,
    ) -> Self {
        let session = Self::new(config, user_id, user_name, transport, api);
        session.connect().await;
        session
    }

    /// The signed-in user this session belongs to.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Dial the socket (and request the snapshot). Failure lands on the
    /// status channel, not as a return value.
    pub async fn connect(&self) {
        self.connection.connect(&self.user_id).await;
    }

    /// Close the socket and cancel all pending typing-expiry timers.
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
        self.dispatcher.typing().clear();
    }

    /// Explicit retry after a connection failure.
    pub async fn reconnect(&self) {
        self.dispatcher.typing().clear();
        self.connection.reconnect(&self.user_id).await;
    }

    /// Tear the session down: socket, timers, stores, and subscriptions.
    pub async fn dispose(&self) {
        self.disconnect().await;
        self.store.lock().await.clear();
        self.subscriptions.clear();
        debug!(user_id = %self.user_id, "chat session disposed");
    }

    // --- sending ---

    /// Send a text message: optimistic insert, then the REST call.
    pub async fn send_text(
        &self,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<(), ChatError> {
        self.send_message(conversation_id, MessageKind::Text, content, None).await
    }

    /// Send a file/audio/video message with its attachment payload.
    pub async fn send_attachment(
        &self,
        conversation_id: ConversationId,
        kind: MessageKind,
        attachment: Attachment,
    ) -> Result<(), ChatError> {
        if matches!(kind, MessageKind::Text | MessageKind::Order) {
            return Err(ChatError::api(format!("kind {kind} does not carry an attachment")));
        }
        self.send_message(conversation_id, kind, "", Some(attachment)).await
    }

    async fn send_message(
        &self,
        conversation_id: ConversationId,
        kind: MessageKind,
        content: &str,
        attachment: Option<Attachment>,
    ) -> Result<(), ChatError> {
        let mut message = Message::optimistic(
            conversation_id.clone(),
            self.user_id.clone(),
            kind,
            content,
            Utc::now(),
        );
        if let Some(ref attachment) = attachment {
            message.file_name = Some(attachment.file_name.clone());
        }

        self.store.lock().await.add_optimistic(message);
        self.subscriptions.notify(&StoreChange {
            conversation_id: conversation_id.clone(),
            kind: ChangeKind::Message,
        });

        // The REST result is surfaced to the caller but never rolls the
        // optimistic entry back; the socket echo owns reconciliation.
        self.api
            .send_message(SendMessageRequest {
                conversation_id,
                sender_id: self.user_id.clone(),
                kind,
                content: content.to_string(),
                attachment,
            })
            .await
    }

    /// Start (or resume) a direct conversation and register a placeholder
    /// contact until the snapshot confirms it.
    pub async fn start_conversation(
        &self,
        other: &UserId,
        other_name: &str,
        other_avatar: Option<String>,
    ) -> Result<ConversationId, ChatError> {
        let conversation_id = self.api.start_conversation(&self.user_id, other).await?;
        self.store.lock().await.add_temp_contact(TempContact {
            conversation_id: conversation_id.clone(),
            user_id: other.clone(),
            name: other_name.to_string(),
            avatar_url: other_avatar,
        });
        Ok(conversation_id)
    }

    /// Mark a message read: socket receipt plus the REST persistence call.
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        let receipt = Envelope::read_receipt(conversation_id.clone(), &self.user_id, message_id);
        self.connection.send(&receipt).await;
        self.api.mark_message_read(&conversation_id, message_id).await
    }

    /// Emit a typing indicator for this user. Dropped if disconnected.
    pub async fn send_typing(&self, conversation_id: ConversationId) -> bool {
        let envelope = Envelope::typing(conversation_id, &self.user_id, &self.user_name, true);
        self.connection.send(&envelope).await
    }

    /// Emit a stop-typing indicator for this user. Dropped if disconnected.
    pub async fn send_stop_typing(&self, conversation_id: ConversationId) -> bool {
        let envelope = Envelope::typing(conversation_id, &self.user_id, &self.user_name, false);
        self.connection.send(&envelope).await
    }

    /// Full-text search within one conversation (REST collaborator).
    pub async fn search_messages(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<Vec<Message>, ChatError> {
        self.api.search_messages(conversation_id, query).await
    }

    // --- observation ---

    /// Register a listener for one conversation or the `"all"` sentinel.
    pub fn subscribe(
        &self,
        conversation_id: ConversationId,
        listener: StoreListener,
    ) -> SubscriptionId {
        self.subscriptions.subscribe(conversation_id, listener)
    }

    /// Remove all listeners for a conversation id.
    pub fn unsubscribe(&self, conversation_id: &ConversationId) -> usize {
        self.subscriptions.unsubscribe(conversation_id)
    }

    /// Remove one listener by its handle.
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe_id(id)
    }

    /// Snapshot of the recency-ordered conversation list.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.store.lock().await.conversations.list()
    }

    /// Snapshot of one conversation's ordered message list.
    pub async fn messages(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.store.lock().await.messages.messages(conversation_id).to_vec()
    }

    /// Users currently typing in one conversation.
    pub fn typing_users(&self, conversation_id: &ConversationId) -> Vec<TypingEntry> {
        self.dispatcher.typing().typing_users(conversation_id)
    }

    /// The placeholder contact for a locally-started conversation, if the
    /// snapshot has not confirmed it yet.
    pub async fn temp_contact(&self, conversation_id: &ConversationId) -> Option<TempContact> {
        self.store.lock().await.contacts.get(conversation_id).cloned()
    }

    /// Current connection status (state, error flag, loading).
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Watch connection status changes instead of polling.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }
}
