// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Production WebSocket transport over tokio-tungstenite.
//!
//! One socket per authenticated user, dialed with the user id as a query
//! parameter. Ping/pong is handled by the tungstenite layer; binary frames
//! are ignored -- the chat protocol is text-only JSON envelopes.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use trimly_core::envelope::Envelope;
use trimly_core::error::ChatError;
use trimly_core::traits::{SocketTransport, TransportEvent};
use trimly_core::types::UserId;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// [`SocketTransport`] backed by a tokio-tungstenite WebSocket.
pub struct WsTransport {
    endpoint: String,
    writer: Mutex<Option<WsSink>>,
    reader: Mutex<Option<WsSource>>,
    open: AtomicBool,
}

impl WsTransport {
    /// Create a transport for the given `ws://`/`wss://` endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            open: AtomicBool::new(false),
        }
    }

    fn dial_url(&self, user_id: &UserId) -> Result<url::Url, ChatError> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| ChatError::Config(format!("invalid socket url: {e}")))?;
        url.query_pairs_mut().append_pair("user_id", &user_id.0);
        Ok(url)
    }
}

#[async_trait]
impl SocketTransport for WsTransport {
    async fn connect(&self, user_id: &UserId) -> Result<(), ChatError> {
        let url = self.dial_url(user_id)?;
        let (stream, _response) =
            connect_async(url.as_str()).await.map_err(|e| ChatError::Transport {
                message: format!("websocket connect failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        self.open.store(true, Ordering::SeqCst);
        debug!(user_id = %user_id, "websocket connected");
        Ok(())
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), ChatError> {
        let json = serde_json::to_string(envelope)?;
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(ChatError::Closed);
        };
        sink.send(WsMessage::Text(json.into())).await.map_err(|e| {
            self.open.store(false, Ordering::SeqCst);
            ChatError::Transport {
                message: format!("websocket send failed: {e}"),
                source: Some(Box::new(e)),
            }
        })
    }

    async fn next_event(&self) -> Result<TransportEvent, ChatError> {
        loop {
            let frame = {
                let mut reader = self.reader.lock().await;
                let Some(source) = reader.as_mut() else {
                    return Ok(TransportEvent::Closed);
                };
                source.next().await
            };

            match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    return Ok(TransportEvent::Frame(text.to_string()));
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    self.open.store(false, Ordering::SeqCst);
                    return Ok(TransportEvent::Closed);
                }
                Some(Ok(other)) => {
                    // Binary/ping/pong frames carry no envelopes.
                    debug!(frame = ?other, "non-text frame ignored");
                }
                Some(Err(e)) => {
                    self.open.store(false, Ordering::SeqCst);
                    warn!(error = %e, "websocket read error");
                    return Err(ChatError::Transport {
                        message: format!("websocket read failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            }
        }
    }

    async fn close(&self) -> Result<(), ChatError> {
        self.open.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        if let Some(sink) = writer.as_mut() {
            // Best-effort close frame; the peer may already be gone.
            let _ = sink.send(WsMessage::Close(None)).await;
        }
        *writer = None;
        *self.reader.lock().await = None;
        Ok(())
    }

    async fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_url_appends_user_id() {
        let transport = WsTransport::new("wss://chat.trimly.app/ws");
        let url = transport.dial_url(&UserId("u-42".to_string())).unwrap();
        assert_eq!(url.as_str(), "wss://chat.trimly.app/ws?user_id=u-42");
    }

    #[test]
    fn dial_url_rejects_garbage_endpoint() {
        let transport = WsTransport::new("not a url");
        let err = transport.dial_url(&UserId("u".to_string())).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[tokio::test]
    async fn send_before_connect_reports_closed() {
        let transport = WsTransport::new("wss://chat.trimly.app/ws");
        let envelope = Envelope::snapshot_request(&UserId("u".to_string()));
        let err = transport.send(&envelope).await.unwrap_err();
        assert!(matches!(err, ChatError::Closed));
        assert!(!transport.is_open().await);
    }

    #[tokio::test]
    async fn next_event_without_connection_is_closed() {
        let transport = WsTransport::new("wss://chat.trimly.app/ws");
        let event = transport.next_event().await.unwrap();
        assert_eq!(event, TransportEvent::Closed);
    }
}
