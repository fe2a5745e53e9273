// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The uniform event structure exchanged over the socket.
//!
//! Server -> Client and Client -> Server share one shape (JSON):
//! ```json
//! {"type": "text", "conversation_id": "c1", "sender_id": "u1",
//!  "data": {...}, "timestamp": 1700000000000}
//! ```
//!
//! Event types are a closed enum with an `Unknown` fallback so that the
//! dispatcher matches exhaustively while staying forward compatible with
//! event types this client does not know yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::types::{Conversation, ConversationId, Message, MessageId, MessageKind, UserId};

/// The type tag of a socket envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// Bulk snapshot of every conversation and its messages.
    AllConversations,
    Text,
    File,
    Audio,
    Video,
    Order,
    ReadReceipt,
    Typing,
    StopTyping,
    /// Any type string this client does not recognize. Logged and ignored.
    #[strum(default)]
    Unknown(String),
}

impl EventKind {
    /// Whether this kind carries confirmed chat message(s) in `data`.
    pub fn is_message(&self) -> bool {
        matches!(
            self,
            EventKind::Text | EventKind::File | EventKind::Audio | EventKind::Video
        )
    }

    /// The message kind corresponding to a message-bearing event, if any.
    pub fn message_kind(&self) -> Option<MessageKind> {
        match self {
            EventKind::Text => Some(MessageKind::Text),
            EventKind::File => Some(MessageKind::File),
            EventKind::Audio => Some(MessageKind::Audio),
            EventKind::Video => Some(MessageKind::Video),
            EventKind::Order => Some(MessageKind::Order),
            _ => None,
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // EnumString with a default variant never fails to parse.
        Ok(s.parse().unwrap_or(EventKind::Unknown(s)))
    }
}

/// One frame on the socket, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Build an envelope with the given kind and data, stamped now.
    pub fn new(
        kind: EventKind,
        conversation_id: ConversationId,
        sender_id: UserId,
        data: Option<serde_json::Value>,
    ) -> Self {
        Envelope {
            kind,
            conversation_id,
            sender_id,
            data,
            timestamp: Utc::now(),
        }
    }

    /// The bulk-snapshot request sent immediately after the socket opens.
    pub fn snapshot_request(user_id: &UserId) -> Self {
        Envelope::new(
            EventKind::AllConversations,
            ConversationId::all(),
            user_id.clone(),
            None,
        )
    }

    /// A typing or stop-typing indicator for one conversation.
    pub fn typing(
        conversation_id: ConversationId,
        user_id: &UserId,
        user_name: &str,
        is_typing: bool,
    ) -> Self {
        let kind = if is_typing {
            EventKind::Typing
        } else {
            EventKind::StopTyping
        };
        let data = serde_json::json!({
            "user_id": user_id,
            "user_name": user_name,
            "is_typing": is_typing,
        });
        Envelope::new(kind, conversation_id, user_id.clone(), Some(data))
    }

    /// A read receipt for one message.
    pub fn read_receipt(
        conversation_id: ConversationId,
        reader_id: &UserId,
        message_id: &MessageId,
    ) -> Self {
        let data = serde_json::json!({ "message_id": message_id });
        Envelope::new(
            EventKind::ReadReceipt,
            conversation_id,
            reader_id.clone(),
            Some(data),
        )
    }
}

/// One `(conversation, messages)` pair inside the snapshot payload.
///
/// A missing or null `messages` array is an empty list, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub conversation: Conversation,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// Payload of an `all_conversations` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub conversations: Vec<SnapshotEntry>,
}

/// Payload of `text`/`file`/`audio`/`video`/`order` events.
///
/// The server sends either a single `message` or a `messages` batch, and
/// may include the full conversation for upsert when the client has not
/// seen it yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    pub conversation: Option<Conversation>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl MessagePayload {
    /// All confirmed messages in this payload, single-or-batch collapsed.
    pub fn into_messages(self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if let Some(msg) = self.message {
            out.push(msg);
        }
        out.extend(self.messages);
        out
    }
}

/// Payload of a `read_receipt` event. The reader is the envelope's sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadReceiptPayload {
    pub message_id: MessageId,
}

/// Payload of `typing`/`stop_typing` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingPayload {
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub is_typing: bool,
}
