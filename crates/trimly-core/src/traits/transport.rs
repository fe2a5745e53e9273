// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket transport trait the connection manager drives.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::ChatError;
use crate::types::UserId;

/// One item from the transport's inbound stream.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A raw text frame, expected to decode into an [`Envelope`].
    Frame(String),
    /// The peer closed the connection (or it dropped).
    Closed,
}

/// A bidirectional socket scoped to one authenticated user.
///
/// Implementations use interior mutability: the connection manager holds
/// the transport behind an `Arc` and may call `send` from the UI side
/// while the read loop sits in `next_event`.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    /// Open the socket for the given user. Idempotent reconnect is not
    /// required; callers close before dialing again.
    async fn connect(&self, user_id: &UserId) -> Result<(), ChatError>;

    /// Serialize and push one envelope. Fire-and-forget: a successful
    /// return means the frame was handed to the socket, nothing more.
    async fn send(&self, envelope: &Envelope) -> Result<(), ChatError>;

    /// Wait for the next inbound frame or close notification.
    async fn next_event(&self) -> Result<TransportEvent, ChatError>;

    /// Close the socket. Safe to call when already closed.
    async fn close(&self) -> Result<(), ChatError>;

    /// Whether the socket is currently open.
    async fn is_open(&self) -> bool;
}
