// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle, event dispatch, and the session facade for the
//! Trimly chat core.
//!
//! The entry point is [`ChatSession`]: one per signed-in user, wrapping a
//! single multiplexed socket, the in-memory stores, and the REST
//! collaborator. Screens observe state through subscriptions and the
//! watchable connection status.

pub mod connection;
pub mod debounce;
pub mod dispatcher;
pub mod session;
pub mod transport;

pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus};
pub use debounce::{TypingDebouncer, TypingSignal};
pub use dispatcher::EventDispatcher;
pub use session::ChatSession;
pub use transport::WsTransport;
