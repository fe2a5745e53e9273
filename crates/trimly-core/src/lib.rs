// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Trimly chat synchronization layer.
//!
//! This crate provides the wire envelope, the conversation/message data
//! model, the error taxonomy, configuration, and the trait seams through
//! which the sync core talks to the socket and the REST backend.

pub mod config;
pub mod envelope;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use config::ChatConfig;
pub use envelope::{Envelope, EventKind};
pub use error::ChatError;
pub use types::{Conversation, ConversationId, Message, MessageId, MessageKind, UserId};

pub use traits::{Attachment, ChatApi, SendMessageRequest, SocketTransport, TransportEvent};
