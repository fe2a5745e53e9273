// SPDX-FileCopyrightText: 2026 Trimly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Trimly chat synchronization core.

use thiserror::Error;

/// The primary error type used across the chat core's traits and operations.
///
/// The dispatcher never propagates these across `handle()`; they surface only
/// from the explicit call sites (connect, REST sends, config loading).
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration errors (invalid TOML, unknown keys, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket transport errors (connect failure, handshake, broken pipe).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Wire codec errors (malformed envelope JSON).
    #[error("codec error: {source}")]
    Codec {
        #[from]
        source: serde_json::Error,
    },

    /// REST collaborator errors (send-message, mark-read, search).
    #[error("api error: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The socket is not open for the attempted operation.
    #[error("connection closed")]
    Closed,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Shorthand for a transport error with no underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        ChatError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an API error with no underlying source.
    pub fn api(message: impl Into<String>) -> Self {
        ChatError::Api {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let err = ChatError::transport("socket refused");
        assert_eq!(err.to_string(), "transport error: socket refused");
    }

    #[test]
    fn codec_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ChatError = parse_err.into();
        assert!(err.to_string().starts_with("codec error:"));
    }

    #[test]
    fn closed_error_display() {
        assert_eq!(ChatError::Closed.to_string(), "connection closed");
    }
}
