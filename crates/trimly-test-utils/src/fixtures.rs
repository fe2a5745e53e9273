// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for conversations, messages, and inbound envelopes.
//!
//! Timestamps default to a fixed epoch so ordering assertions are
//! deterministic; tests that exercise the reconciliation window pass
//! their own times.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use trimly_core::envelope::{Envelope, EventKind};
use trimly_core::types::{
    Conversation, ConversationId, LastMessage, Message, MessageId, MessageKind, Participant,
    UserId,
};

/// A fixed, arbitrary base instant for fixture timestamps.
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default()
}

pub fn conversation_id(id: &str) -> ConversationId {
    ConversationId(id.to_string())
}

pub fn user_id(id: &str) -> UserId {
    UserId(id.to_string())
}

pub fn participant(id: &str, name: &str) -> Participant {
    Participant {
        id: user_id(id),
        display_name: name.to_string(),
        avatar_url: None,
    }
}

/// A bare conversation with no participants and no last message.
pub fn conversation(id: &str) -> Conversation {
    Conversation {
        id: conversation_id(id),
        participants: Vec::new(),
        last_message: None,
    }
}

/// A conversation whose last-message summary points at `message`.
pub fn conversation_with_last(id: &str, message: &Message) -> Conversation {
    Conversation {
        id: conversation_id(id),
        participants: Vec::new(),
        last_message: Some(LastMessage::from(message)),
    }
}

/// A confirmed text message created at [`base_time`].
pub fn text_message(conv: &str, id: &str, sender: &str, content: &str) -> Message {
    message_at(conv, id, sender, content, base_time())
}

/// A confirmed text message created at the given instant.
pub fn message_at(
    conv: &str,
    id: &str,
    sender: &str,
    content: &str,
    created_at: DateTime<Utc>,
) -> Message {
    Message {
        id: MessageId(id.to_string()),
        conversation_id: conversation_id(conv),
        sender_id: user_id(sender),
        kind: MessageKind::Text,
        content: content.to_string(),
        file_url: None,
        file_name: None,
        order: None,
        created_at,
        delivered_at: None,
        updated_at: None,
        read_by: Vec::new(),
        metadata: None,
        optimistic: false,
    }
}

/// An inbound `text` event delivering one confirmed message, including
/// the conversation for upsert.
pub fn text_message_event(message: &Message) -> Envelope {
    let conversation = conversation_with_last(&message.conversation_id.0, message);
    Envelope::new(
        EventKind::Text,
        message.conversation_id.clone(),
        message.sender_id.clone(),
        Some(json!({
            "conversation": conversation,
            "message": message,
        })),
    )
}

/// An inbound message event with no conversation payload (the gap case
/// for conversations the client has never seen).
pub fn bare_message_event(kind: EventKind, message: &Message) -> Envelope {
    Envelope::new(
        kind,
        message.conversation_id.clone(),
        message.sender_id.clone(),
        Some(json!({ "message": message })),
    )
}

/// An inbound `all_conversations` snapshot event.
///
/// Each entry pairs a conversation with its message list; `None` models
/// the server's null messages array.
pub fn snapshot_event(entries: Vec<(Conversation, Option<Vec<Message>>)>) -> Envelope {
    let conversations: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|(conversation, messages)| {
            json!({
                "conversation": conversation,
                "messages": messages,
            })
        })
        .collect();
    Envelope::new(
        EventKind::AllConversations,
        ConversationId::all(),
        user_id("server"),
        Some(json!({ "conversations": conversations })),
    )
}

/// An inbound typing or stop-typing event from another user.
pub fn typing_event(conv: &str, sender: &str, name: &str, is_typing: bool) -> Envelope {
    Envelope::typing(conversation_id(conv), &user_id(sender), name, is_typing)
}

/// An inbound read receipt from another user.
pub fn read_receipt_event(conv: &str, reader: &str, message: &str) -> Envelope {
    Envelope::read_receipt(
        conversation_id(conv),
        &user_id(reader),
        &MessageId(message.to_string()),
    )
}
