// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat core configuration: serde model plus a Figment loader.
//!
//! Loaded from an optional TOML file with `TRIMLY_` environment variable
//! overrides. Unknown keys are rejected at load time.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Configuration for the chat synchronization core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// WebSocket endpoint the connection manager dials.
    #[serde(default = "default_socket_url")]
    pub socket_url: String,

    /// Base URL for the REST collaborators (send-message, mark-read, search).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Window within which a confirmed message replaces an optimistic one
    /// from the same sender with the same kind.
    #[serde(default = "default_reconcile_window_secs")]
    pub reconcile_window_secs: u64,

    /// Silence after which a typing indicator expires on its own.
    #[serde(default = "default_typing_expiry_secs")]
    pub typing_expiry_secs: u64,

    /// Sender-side inactivity before `stop_typing` is emitted.
    #[serde(default = "default_typing_debounce_secs")]
    pub typing_debounce_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            socket_url: default_socket_url(),
            api_base_url: default_api_base_url(),
            reconcile_window_secs: default_reconcile_window_secs(),
            typing_expiry_secs: default_typing_expiry_secs(),
            typing_debounce_secs: default_typing_debounce_secs(),
        }
    }
}

impl ChatConfig {
    /// Reconciliation window as a [`Duration`].
    pub fn reconcile_window(&self) -> Duration {
        Duration::from_secs(self.reconcile_window_secs)
    }

    /// Typing auto-expiry as a [`Duration`].
    pub fn typing_expiry(&self) -> Duration {
        Duration::from_secs(self.typing_expiry_secs)
    }

    /// Typing debounce as a [`Duration`].
    pub fn typing_debounce(&self) -> Duration {
        Duration::from_secs(self.typing_debounce_secs)
    }
}

fn default_socket_url() -> String {
    "wss://chat.trimly.app/ws".to_string()
}

fn default_api_base_url() -> String {
    "https://api.trimly.app".to_string()
}

fn default_reconcile_window_secs() -> u64 {
    5
}

fn default_typing_expiry_secs() -> u64 {
    5
}

fn default_typing_debounce_secs() -> u64 {
    2
}

/// Load configuration from compiled defaults with `TRIMLY_` env overrides.
pub fn load_config() -> Result<ChatConfig, ChatError> {
    base_figment()
        .extract()
        .map_err(|e| ChatError::Config(e.to_string()))
}

/// Load configuration from a specific TOML file with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatConfig, ChatError> {
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRIMLY_"))
        .extract()
        .map_err(|e| ChatError::Config(e.to_string()))
}

/// Load configuration from an inline TOML string (tests, embedding).
pub fn load_config_from_str(toml_content: &str) -> Result<ChatConfig, ChatError> {
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
        .map_err(|e| ChatError::Config(e.to_string()))
}

fn base_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChatConfig::default()))
        .merge(Env::prefixed("TRIMLY_"))
}
