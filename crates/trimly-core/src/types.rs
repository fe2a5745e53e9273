// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared across the chat core: conversations, messages,
//! participants, and the ephemeral typing/contact entries.
//!
//! All timestamps are epoch milliseconds on the wire (`chrono` serde
//! adapters); `metadata` is an opaque JSON pass-through that the core
//! never inspects or rewrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// The sentinel id conversation-list screens subscribe to.
    pub fn all() -> Self {
        ConversationId("all".to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (customer or stylist).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
///
/// Server-confirmed ids come from the backend; optimistic entries carry a
/// locally generated `local-` id until the socket echo reconciles them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a temporary id for an optimistic message.
    pub fn local() -> Self {
        MessageId(format!("local-{}", uuid::Uuid::new_v4()))
    }

    /// Whether this id was generated locally (not yet server-confirmed).
    pub fn is_local(&self) -> bool {
        self.0.starts_with("local-")
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The content type of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    File,
    Audio,
    Video,
    Order,
}

/// One participant in a conversation (at most two per conversation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A read receipt on a message: who read it, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadEntry {
    pub user_id: UserId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub read_at: DateTime<Utc>,
}

/// Embedded order payload on `order` messages.
///
/// Only the id and status are recognized; every other field is carried
/// through untouched for the order screens to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A chat message, either server-confirmed or an optimistic local entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub order: Option<OrderSummary>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_by: Vec<ReadEntry>,
    /// Monitoring/analysis metadata, passed through unmodified.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Local-only flag: true until the server echo replaces this entry.
    #[serde(default, skip_serializing)]
    pub optimistic: bool,
}

impl Message {
    /// Build an optimistic text message from local input.
    pub fn optimistic(
        conversation_id: ConversationId,
        sender_id: UserId,
        kind: MessageKind,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Message {
            id: MessageId::local(),
            conversation_id,
            sender_id,
            kind,
            content: content.into(),
            file_url: None,
            file_name: None,
            order: None,
            created_at: now,
            delivered_at: None,
            updated_at: None,
            read_by: Vec::new(),
            metadata: None,
            optimistic: true,
        }
    }

    /// Record a read receipt, ignoring duplicate readers.
    pub fn mark_read_by(&mut self, user_id: UserId, read_at: DateTime<Utc>) -> bool {
        if self.read_by.iter().any(|e| e.user_id == user_id) {
            return false;
        }
        self.read_by.push(ReadEntry { user_id, read_at });
        true
    }
}

/// Summary of a conversation's most recent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMessage {
    pub id: MessageId,
    #[serde(default)]
    pub content: String,
    pub sender_id: UserId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read_by: Vec<ReadEntry>,
}

impl From<&Message> for LastMessage {
    fn from(msg: &Message) -> Self {
        LastMessage {
            id: msg.id.clone(),
            content: msg.content.clone(),
            sender_id: msg.sender_id.clone(),
            kind: msg.kind,
            timestamp: msg.created_at,
            read_by: msg.read_by.clone(),
        }
    }
}

/// A conversation summary as held by the conversation store.
///
/// Conversations are never hard-deleted client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
}

impl Conversation {
    /// Whether the latest message is unread by `me`.
    ///
    /// Derived from the last-message summary: a message from someone else
    /// that `me` has not receipted counts as unread.
    pub fn has_unread(&self, me: &UserId) -> bool {
        match &self.last_message {
            Some(last) => {
                last.sender_id != *me && !last.read_by.iter().any(|e| e.user_id == *me)
            }
            None => false,
        }
    }

    /// The participant that is not `me`, if present.
    pub fn counterpart(&self, me: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != *me)
    }
}

/// A user currently typing in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEntry {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub user_name: String,
}

/// Placeholder contact for a conversation started locally before the
/// server snapshot confirms its existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempContact {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
