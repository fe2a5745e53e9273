// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the chat core and its external collaborators.
//!
//! The core owns no I/O policy beyond these interfaces: the socket is a
//! [`SocketTransport`], the REST endpoints are a [`ChatApi`]. Both use
//! `#[async_trait]` for dynamic dispatch.

pub mod api;
pub mod transport;

pub use api::{Attachment, ChatApi, SendMessageRequest};
pub use transport::{SocketTransport, TransportEvent};
