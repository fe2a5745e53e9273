// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock socket transport for deterministic testing.
//!
//! `MockTransport` implements `SocketTransport` with injectable inbound
//! frames and captured outbound envelopes for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use trimly_core::envelope::Envelope;
use trimly_core::error::ChatError;
use trimly_core::traits::{SocketTransport, TransportEvent};
use trimly_core::types::UserId;

/// A mock socket for testing.
///
/// Provides two queues:
/// - **inbound**: Items injected via `inject_frame()` / `inject_raw()` /
///   `inject_close()` are returned by `next_event()` in order
/// - **sent**: Envelopes passed to `send()` are captured and retrievable
///   via `sent_envelopes()`
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<TransportEvent>>>,
    sent: Arc<Mutex<Vec<Envelope>>>,
    notify: Arc<Notify>,
    open: AtomicBool,
    fail_connect: AtomicBool,
    connected_as: Mutex<Option<UserId>>,
}

impl MockTransport {
    /// Create a new mock transport with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            open: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            connected_as: Mutex::new(None),
        }
    }

    /// Make the next `connect()` call fail with a transport error.
    pub fn fail_next_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Inject an inbound envelope as a serialized text frame.
    pub async fn inject_frame(&self, envelope: &Envelope) {
        let json = serde_json::to_string(envelope)
            .unwrap_or_else(|_| "{}".to_string());
        self.inject_raw(json).await;
    }

    /// Inject a raw text frame (for malformed-frame tests).
    pub async fn inject_raw(&self, text: impl Into<String>) {
        self.inbound
            .lock()
            .await
            .push_back(TransportEvent::Frame(text.into()));
        self.notify.notify_one();
    }

    /// Inject a peer-close notification.
    pub async fn inject_close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.inbound.lock().await.push_back(TransportEvent::Closed);
        self.notify.notify_one();
    }

    /// The user id the last successful `connect()` was dialed with.
    pub async fn connected_user(&self) -> Option<UserId> {
        self.connected_as.lock().await.clone()
    }

    /// All envelopes that were pushed through `send()`.
    pub async fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent.lock().await.clone()
    }

    /// The count of sent envelopes.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all captured outbound envelopes.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketTransport for MockTransport {
    async fn connect(&self, user_id: &UserId) -> Result<(), ChatError> {
        if self.fail_connect.swap(false, Ordering::SeqCst) {
            return Err(ChatError::transport("mock connect refused"));
        }
        *self.connected_as.lock().await = Some(user_id.clone());
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), ChatError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ChatError::Closed);
        }
        self.sent.lock().await.push(envelope.clone());
        Ok(())
    }

    async fn next_event(&self) -> Result<TransportEvent, ChatError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            // Wait for the next injection.
            self.notify.notified().await;
        }
    }

    async fn close(&self) -> Result<(), ChatError> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
