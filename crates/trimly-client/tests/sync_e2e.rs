// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the chat session over a mock socket.
//!
//! Each test builds an isolated session with a mock transport and a
//! recording REST collaborator, injects inbound frames, and asserts on
//! the observable state. Tests run on the paused tokio clock so typing
//! expiry is deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trimly_client::{ChatSession, ConnectionState};
use trimly_core::SocketTransport;
use trimly_core::config::ChatConfig;
use trimly_core::envelope::EventKind;
use trimly_core::types::MessageKind;
use trimly_store::ChangeKind;
use trimly_test_utils::fixtures::{
    self, conversation, conversation_id, text_message, text_message_event, user_id,
};
use trimly_test_utils::{MockApi, MockTransport};

/// Let the spawned read loop drain everything injected so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn session_with(
    transport: Arc<MockTransport>,
    api: Arc<MockApi>,
) -> ChatSession {
    let config = ChatConfig::default();
    ChatSession::init(&config, user_id("me"), "Me", transport, api).await
}

// ---- Connect and snapshot ----

#[tokio::test(start_paused = true)]
async fn connect_sends_snapshot_request_for_the_user() {
    let transport = Arc::new(MockTransport::new());
    let _session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    assert_eq!(transport.connected_user().await, Some(user_id("me")));
    let sent = transport.sent_envelopes().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EventKind::AllConversations);
}

#[tokio::test(start_paused = true)]
async fn snapshot_replaces_state_and_clears_loading() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;
    assert!(session.status().loading);

    let snapshot = fixtures::snapshot_event(vec![
        (conversation("a"), Some(vec![text_message("a", "m1", "u2", "hi")])),
        (conversation("b"), None),
    ]);
    transport.inject_frame(&snapshot).await;
    settle().await;

    let conversations = session.conversations().await;
    assert_eq!(conversations.len(), 2);
    assert_eq!(session.messages(&conversation_id("a")).await.len(), 1);
    assert!(session.messages(&conversation_id("b")).await.is_empty());
    assert!(!session.status().loading);
    assert_eq!(session.status().state, ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn failed_connect_surfaces_on_status_and_reconnect_recovers() {
    let transport = Arc::new(MockTransport::new());
    transport.fail_next_connect();
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let status = session.status();
    assert_eq!(status.state, ConnectionState::Failed);
    assert!(status.connection_error);
    assert!(!status.loading);

    session.reconnect().await;
    let status = session.status();
    assert_eq!(status.state, ConnectionState::Connected);
    assert!(!status.connection_error);
}

// ---- Message events and ordering ----

#[tokio::test(start_paused = true)]
async fn inbound_message_promotes_conversation_to_front() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let snapshot = fixtures::snapshot_event(vec![
        (conversation("a"), None),
        (conversation("b"), None),
    ]);
    transport.inject_frame(&snapshot).await;

    let message = text_message("b", "m1", "u2", "newest");
    transport.inject_frame(&text_message_event(&message)).await;
    settle().await;

    let order: Vec<String> = session
        .conversations()
        .await
        .into_iter()
        .map(|c| c.id.0)
        .collect();
    assert_eq!(order, vec!["b", "a"]);
    assert_eq!(session.messages(&conversation_id("b")).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn message_for_unknown_conversation_upserts_from_payload() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;
    transport.inject_frame(&fixtures::snapshot_event(vec![])).await;

    let message = text_message("fresh", "m1", "u2", "hello there");
    transport.inject_frame(&text_message_event(&message)).await;
    settle().await;

    let conversations = session.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].id.0, "fresh");
    assert_eq!(
        conversations[0].last_message.as_ref().map(|l| l.id.0.as_str()),
        Some("m1")
    );
}

#[tokio::test(start_paused = true)]
async fn null_data_event_leaves_state_unchanged() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    transport
        .inject_raw(
            r#"{"type":"text","conversation_id":"c1","sender_id":"u2","data":null,"timestamp":1700000000000}"#,
        )
        .await;
    transport.inject_raw("this is not json").await;
    settle().await;

    assert!(session.conversations().await.is_empty());
    assert!(session.messages(&conversation_id("c1")).await.is_empty());
    // The read loop survives both frames.
    assert_eq!(session.status().state, ConnectionState::Connected);
}

// ---- Optimistic sends ----

#[tokio::test(start_paused = true)]
async fn send_text_inserts_optimistic_entry_and_calls_rest() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockApi::new());
    let session = session_with(Arc::clone(&transport), Arc::clone(&api)).await;

    session.send_text(conversation_id("c1"), "Hello").await.unwrap();

    let messages = session.messages(&conversation_id("c1")).await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].optimistic);
    assert!(messages[0].id.is_local());
    assert_eq!(messages[0].content, "Hello");

    let requests = api.sent_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].kind, MessageKind::Text);
    assert_eq!(requests[0].content, "Hello");

    // The conversation list grew a local entry at the front.
    assert_eq!(session.conversations().await[0].id.0, "c1");
}

#[tokio::test(start_paused = true)]
async fn socket_echo_replaces_optimistic_entry() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    session.send_text(conversation_id("c1"), "Hello").await.unwrap();
    assert!(session.messages(&conversation_id("c1")).await[0].optimistic);

    let echo = text_message("c1", "srv-1", "me", "Hello");
    transport.inject_frame(&text_message_event(&echo)).await;
    settle().await;

    let messages = session.messages(&conversation_id("c1")).await;
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].optimistic);
    assert_eq!(messages[0].id.0, "srv-1");
}

#[tokio::test(start_paused = true)]
async fn failed_rest_send_keeps_the_optimistic_entry() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockApi::new());
    api.fail_sends();
    let session = session_with(Arc::clone(&transport), Arc::clone(&api)).await;

    let result = session.send_text(conversation_id("c1"), "doomed").await;
    assert!(result.is_err());

    // No rollback: the entry stays until an echo or reload replaces it.
    let messages = session.messages(&conversation_id("c1")).await;
    assert_eq!(messages.len(), 1);
    assert!(messages[0].optimistic);
}

// ---- Typing indicators ----

#[tokio::test(start_paused = true)]
async fn foreign_typing_registers_and_expires() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    transport
        .inject_frame(&fixtures::typing_event("c1", "u2", "Alice", true))
        .await;
    settle().await;
    assert_eq!(session.typing_users(&conversation_id("c1")).len(), 1);

    // No stop_typing ever arrives; the indicator must expire on its own.
    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert!(session.typing_users(&conversation_id("c1")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn own_typing_echo_is_suppressed() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    transport
        .inject_frame(&fixtures::typing_event("c1", "me", "Me", true))
        .await;
    settle().await;
    assert!(session.typing_users(&conversation_id("c1")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_typing_goes_out_while_connected_and_drops_when_not() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;
    transport.clear_sent().await;

    assert!(session.send_typing(conversation_id("c1")).await);
    assert!(session.send_stop_typing(conversation_id("c1")).await);
    let sent = transport.sent_envelopes().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].kind, EventKind::Typing);
    assert_eq!(sent[1].kind, EventKind::StopTyping);

    session.disconnect().await;
    assert!(!session.send_typing(conversation_id("c1")).await);
    assert_eq!(transport.sent_count().await, 2);
}

// ---- Read receipts ----

#[tokio::test(start_paused = true)]
async fn read_receipt_is_applied_once() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let message = text_message("c1", "m1", "me", "hi");
    transport.inject_frame(&text_message_event(&message)).await;
    let receipt = fixtures::read_receipt_event("c1", "u2", "m1");
    transport.inject_frame(&receipt).await;
    transport.inject_frame(&receipt).await;
    settle().await;

    let messages = session.messages(&conversation_id("c1")).await;
    assert_eq!(messages[0].read_by.len(), 1);
    assert_eq!(messages[0].read_by[0].user_id, user_id("u2"));

    let conversations = session.conversations().await;
    assert_eq!(
        conversations[0].last_message.as_ref().unwrap().read_by.len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn mark_read_sends_receipt_and_persists_via_rest() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockApi::new());
    let session = session_with(Arc::clone(&transport), Arc::clone(&api)).await;
    transport.clear_sent().await;

    let message_id = trimly_core::types::MessageId("m9".to_string());
    session.mark_read(conversation_id("c1"), &message_id).await.unwrap();

    let sent = transport.sent_envelopes().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EventKind::ReadReceipt);
    assert_eq!(sent[0].sender_id, user_id("me"));

    let marks = api.read_marks().await;
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].1.0, "m9");
}

// ---- Subscriptions ----

#[tokio::test(start_paused = true)]
async fn listeners_fire_for_specific_and_sentinel_ids() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let specific = Arc::new(AtomicUsize::new(0));
    let sentinel = Arc::new(AtomicUsize::new(0));
    {
        let counter = Arc::clone(&specific);
        session.subscribe(
            conversation_id("c1"),
            Arc::new(move |change| {
                assert_eq!(change.kind, ChangeKind::Message);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }
    {
        let counter = Arc::clone(&sentinel);
        session.subscribe(
            trimly_core::types::ConversationId::all(),
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }

    let message = text_message("c1", "m1", "u2", "ping");
    transport.inject_frame(&text_message_event(&message)).await;
    settle().await;

    assert_eq!(specific.load(Ordering::SeqCst), 1);
    assert_eq!(sentinel.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_listener_stops_firing() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let id = session.subscribe(
        conversation_id("c1"),
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    assert!(session.unsubscribe_id(id));

    let message = text_message("c1", "m1", "u2", "ping");
    transport.inject_frame(&text_message_event(&message)).await;
    settle().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ---- Contacts and lifecycle ----

#[tokio::test(start_paused = true)]
async fn start_conversation_registers_contact_until_snapshot_confirms() {
    let transport = Arc::new(MockTransport::new());
    let api = Arc::new(MockApi::new());
    api.set_next_conversation_id(conversation_id("c-new")).await;
    let session = session_with(Arc::clone(&transport), Arc::clone(&api)).await;

    let id = session
        .start_conversation(&user_id("stylist-7"), "Sam", None)
        .await
        .unwrap();
    assert_eq!(id, conversation_id("c-new"));
    assert!(session.temp_contact(&id).await.is_some());

    // The next snapshot includes the conversation, so the placeholder goes.
    transport
        .inject_frame(&fixtures::snapshot_event(vec![(conversation("c-new"), None)]))
        .await;
    settle().await;
    assert!(session.temp_contact(&id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn peer_close_moves_status_to_disconnected_without_redial() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    transport.inject_close().await;
    settle().await;

    assert_eq!(session.status().state, ConnectionState::Disconnected);
    // No automatic reconnect: the transport saw exactly one dial.
    assert_eq!(transport.connected_user().await, Some(user_id("me")));
    assert!(!transport.is_open().await);
}

#[tokio::test(start_paused = true)]
async fn dispose_clears_all_session_state() {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MockApi::new())).await;

    let message = text_message("c1", "m1", "u2", "hi");
    transport.inject_frame(&text_message_event(&message)).await;
    transport
        .inject_frame(&fixtures::typing_event("c1", "u2", "Alice", true))
        .await;
    settle().await;
    assert_eq!(session.conversations().await.len(), 1);
    assert_eq!(session.typing_users(&conversation_id("c1")).len(), 1);

    session.dispose().await;

    assert!(session.conversations().await.is_empty());
    assert!(session.messages(&conversation_id("c1")).await.is_empty());
    assert!(session.typing_users(&conversation_id("c1")).is_empty());
    assert_eq!(session.status().state, ConnectionState::Disconnected);
}
