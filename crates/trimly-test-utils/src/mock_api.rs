// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST collaborator for deterministic testing.
//!
//! `MockApi` implements `ChatApi`, recording every call and returning
//! scriptable results so tests can assert on the REST half of a send
//! without a server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use trimly_core::error::ChatError;
use trimly_core::traits::{ChatApi, SendMessageRequest};
use trimly_core::types::{ConversationId, Message, MessageId, UserId};

/// A recording `ChatApi` implementation.
pub struct MockApi {
    sends: Arc<Mutex<Vec<SendMessageRequest>>>,
    read_marks: Arc<Mutex<Vec<(ConversationId, MessageId)>>>,
    started: Arc<Mutex<Vec<(UserId, UserId)>>>,
    next_conversation_id: Mutex<ConversationId>,
    search_results: Mutex<Vec<Message>>,
    fail_sends: AtomicBool,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            sends: Arc::new(Mutex::new(Vec::new())),
            read_marks: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(Mutex::new(Vec::new())),
            next_conversation_id: Mutex::new(ConversationId("mock-conv".to_string())),
            search_results: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `send_message` fail with an API error.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Set the conversation id `start_conversation` returns.
    pub async fn set_next_conversation_id(&self, id: ConversationId) {
        *self.next_conversation_id.lock().await = id;
    }

    /// Set the messages `search_messages` returns.
    pub async fn set_search_results(&self, messages: Vec<Message>) {
        *self.search_results.lock().await = messages;
    }

    /// All recorded `send_message` requests.
    pub async fn sent_requests(&self) -> Vec<SendMessageRequest> {
        self.sends.lock().await.clone()
    }

    /// All recorded `mark_message_read` calls.
    pub async fn read_marks(&self) -> Vec<(ConversationId, MessageId)> {
        self.read_marks.lock().await.clone()
    }

    /// All recorded `start_conversation` calls.
    pub async fn started_pairs(&self) -> Vec<(UserId, UserId)> {
        self.started.lock().await.clone()
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn start_conversation(
        &self,
        me: &UserId,
        other: &UserId,
    ) -> Result<ConversationId, ChatError> {
        self.started.lock().await.push((me.clone(), other.clone()));
        Ok(self.next_conversation_id.lock().await.clone())
    }

    async fn send_message(&self, request: SendMessageRequest) -> Result<(), ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::api("mock send rejected"));
        }
        self.sends.lock().await.push(request);
        Ok(())
    }

    async fn mark_message_read(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<(), ChatError> {
        self.read_marks
            .lock()
            .await
            .push((conversation_id.clone(), message_id.clone()));
        Ok(())
    }

    async fn search_messages(
        &self,
        _conversation_id: &ConversationId,
        _query: &str,
    ) -> Result<Vec<Message>, ChatError> {
        Ok(self.search_results.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimly_core::types::MessageKind;

    fn user(id: &str) -> UserId {
        UserId(id.to_string())
    }

    #[tokio::test]
    async fn send_message_is_recorded() {
        let api = MockApi::new();
        api.send_message(SendMessageRequest {
            conversation_id: ConversationId("c1".to_string()),
            sender_id: user("u1"),
            kind: MessageKind::Text,
            content: "hello".to_string(),
            attachment: None,
        })
        .await
        .unwrap();

        let sent = api.sent_requests().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "hello");
    }

    #[tokio::test]
    async fn fail_sends_rejects_without_recording() {
        let api = MockApi::new();
        api.fail_sends();
        let err = api
            .send_message(SendMessageRequest {
                conversation_id: ConversationId("c1".to_string()),
                sender_id: user("u1"),
                kind: MessageKind::Text,
                content: "hello".to_string(),
                attachment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Api { .. }));
        assert!(api.sent_requests().await.is_empty());
    }

    #[tokio::test]
    async fn start_conversation_returns_scripted_id() {
        let api = MockApi::new();
        api.set_next_conversation_id(ConversationId("c-77".to_string()))
            .await;
        let id = api.start_conversation(&user("me"), &user("them")).await.unwrap();
        assert_eq!(id.0, "c-77");
        assert_eq!(api.started_pairs().await.len(), 1);
    }
}
