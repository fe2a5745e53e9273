// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST collaborator trait.
//!
//! These endpoints are external to the chat core: it calls them to trigger
//! sends and never owns their retry or error policy. A failed REST send is
//! surfaced to the calling screen and does not touch the optimistic entry;
//! only the socket echo reconciles it.

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{ConversationId, Message, MessageId, MessageKind, UserId};

/// A file/audio/video attachment carried by a multipart send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Request body for [`ChatApi::send_message`].
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessageRequest {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub kind: MessageKind,
    pub content: String,
    /// Present for `file`/`audio`/`video` sends (multipart), absent for text (JSON).
    pub attachment: Option<Attachment>,
}

/// The REST endpoints the chat core consumes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create (or fetch) a direct conversation with another user.
    async fn start_conversation(
        &self,
        me: &UserId,
        other: &UserId,
    ) -> Result<ConversationId, ChatError>;

    /// Perform the real send for a message already inserted optimistically.
    async fn send_message(&self, request: SendMessageRequest) -> Result<(), ChatError>;

    /// Persist a read receipt server-side.
    async fn mark_message_read(
        &self,
        conversation_id: &ConversationId,
        message_id: &MessageId,
    ) -> Result<(), ChatError>;

    /// Full-text search within one conversation.
    async fn search_messages(
        &self,
        conversation_id: &ConversationId,
        query: &str,
    ) -> Result<Vec<Message>, ChatError>;
}
