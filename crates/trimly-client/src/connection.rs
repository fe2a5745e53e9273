// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket lifecycle: connect, authenticate, detect failure, reconnect.
//!
//! One socket per authenticated user. On open the manager immediately
//! requests the bulk conversation snapshot, then spawns the read loop that
//! feeds every inbound frame to the dispatcher in delivery order.
//!
//! Failure never propagates as an error from `connect`: it is surfaced as
//! a watchable [`ConnectionStatus`] so screens can show a retry
//! affordance. There is no automatic reconnect loop and no outbound
//! queue -- a send while disconnected is logged and dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use trimly_core::envelope::Envelope;
use trimly_core::traits::{SocketTransport, TransportEvent};
use trimly_core::types::UserId;

use crate::dispatcher::EventDispatcher;

/// Lifecycle state of the socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// The socket errored; retry is an explicit `reconnect()`.
    Failed,
}

/// Observable connection status for screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Set on socket error; cleared by the next connect attempt.
    pub connection_error: bool,
    /// True from connect until the snapshot arrives (or the socket drops).
    pub loading: bool,
}

/// Owns the single socket's lifecycle and the inbound read loop.
pub struct ConnectionManager {
    transport: Arc<dyn SocketTransport>,
    dispatcher: Arc<EventDispatcher>,
    status: watch::Sender<ConnectionStatus>,
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: Arc<EventDispatcher>,
        status: watch::Sender<ConnectionStatus>,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            status,
            read_task: Mutex::new(None),
        }
    }

    /// Open the socket for `user_id`, request the snapshot, and start the
    /// read loop. Failure is recorded on the status channel, not returned.
    pub async fn connect(&self, user_id: &UserId) {
        self.status.send_modify(|s| {
            s.state = ConnectionState::Connecting;
            s.connection_error = false;
            s.loading = true;
        });

        if let Err(e) = self.transport.connect(user_id).await {
            warn!(user_id = %user_id, error = %e, "socket connect failed");
            self.status.send_modify(|s| {
                s.state = ConnectionState::Failed;
                s.connection_error = true;
                s.loading = false;
            });
            return;
        }

        self.status.send_modify(|s| s.state = ConnectionState::Connected);
        info!(user_id = %user_id, "socket connected");

        // The snapshot request is the first frame out; its answer clears
        // the loading flag in the dispatcher.
        let request = Envelope::snapshot_request(user_id);
        if let Err(e) = self.transport.send(&request).await {
            warn!(error = %e, "snapshot request failed");
            self.status.send_modify(|s| {
                s.connection_error = true;
                s.loading = false;
            });
        }

        let mut task = self.read_task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(self.spawn_read_loop());
    }

    /// Push one envelope out. Returns false (after a warn log) when the
    /// socket is not open or the write fails; nothing is queued.
    pub async fn send(&self, envelope: &Envelope) -> bool {
        if !self.transport.is_open().await {
            warn!(kind = %envelope.kind, "socket not open; outbound envelope dropped");
            return false;
        }
        match self.transport.send(envelope).await {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = %envelope.kind, error = %e, "outbound send failed; envelope dropped");
                false
            }
        }
    }

    /// Close the socket and stop the read loop.
    pub async fn disconnect(&self) {
        if let Some(task) = self.read_task.lock().await.take() {
            task.abort();
        }
        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "socket close reported an error");
        }
        self.status.send_modify(|s| {
            s.state = ConnectionState::Disconnected;
            s.loading = false;
        });
        info!("socket disconnected");
    }

    /// Explicit user/UI-triggered retry: tear down, then dial again.
    pub async fn reconnect(&self, user_id: &UserId) {
        self.disconnect().await;
        self.connect(user_id).await;
    }

    fn spawn_read_loop(&self) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let dispatcher = Arc::clone(&self.dispatcher);
        let status = self.status.clone();

        tokio::spawn(async move {
            loop {
                match transport.next_event().await {
                    Ok(TransportEvent::Frame(text)) => {
                        match serde_json::from_str::<Envelope>(&text) {
                            Ok(envelope) => dispatcher.handle(envelope).await,
                            Err(e) => {
                                warn!(error = %e, "undecodable frame skipped");
                            }
                        }
                    }
                    Ok(TransportEvent::Closed) => {
                        info!("socket closed by peer");
                        status.send_modify(|s| {
                            s.state = ConnectionState::Disconnected;
                            s.loading = false;
                        });
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "socket read error");
                        status.send_modify(|s| {
                            s.state = ConnectionState::Failed;
                            s.connection_error = true;
                            s.loading = false;
                        });
                        break;
                    }
                }
            }
        })
    }
}
