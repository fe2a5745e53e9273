// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Trimly chat integration tests.
//!
//! Provides mock collaborators and fixture builders for fast,
//! deterministic, CI-runnable tests without a chat backend.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock socket with frame injection and capture
//! - [`MockApi`] - Recording REST collaborator with scriptable results
//! - [`fixtures`] - Builders for conversations, messages, and envelopes

pub mod fixtures;
pub mod mock_api;
pub mod mock_transport;

pub use mock_api::MockApi;
pub use mock_transport::MockTransport;
