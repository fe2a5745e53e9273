// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory chat state for the Trimly sync core.
//!
//! Four stores, each exclusively owned by one session: the recency-ordered
//! conversation list, the per-conversation message lists with optimistic
//! reconciliation, the auto-expiring typing tracker, and the temporary
//! contact placeholders. The subscription registry fans store changes out
//! to listening screens.

pub mod contacts;
pub mod conversations;
pub mod messages;
pub mod state;
pub mod subscriptions;
pub mod typing;

pub use contacts::TempContacts;
pub use conversations::ConversationStore;
pub use messages::MessageStore;
pub use state::{ChatStore, MessageApplied};
pub use subscriptions::{
    ChangeKind, StoreChange, StoreListener, SubscriptionId, SubscriptionRegistry,
};
pub use typing::{ExpiryNotifier, TypingTracker};
