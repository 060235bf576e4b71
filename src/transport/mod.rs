//! Messaging transport seam.
//!
//! The relay only needs three operations from the chat platform: send a
//! message, edit it in place and delete it. [`Transport`] abstracts those so
//! the relay can be driven by the Telegram client in production and by an
//! in-memory double in tests.

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

/// Chat that receives relayed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recipient(pub i64);

/// Remote identity of a sent message, needed to edit or delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
        }
    }
}

/// Per-message display options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    /// Suppress link previews.
    pub disable_preview: bool,
    /// Deliver without a notification sound.
    pub silent: bool,
}

impl SendOptions {
    /// Options used for relayed command output: HTML, no previews, silent.
    pub fn relay() -> Self {
        Self {
            parse_mode: Some(ParseMode::Html),
            disable_preview: true,
            silent: true,
        }
    }

    /// Plain text with default notification behaviour.
    pub fn plain() -> Self {
        Self::default()
    }
}

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request never got a usable response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Platform answered with `ok: false`.
    #[error("API error: {description}")]
    Api { description: String },

    /// Message refused without a platform round-trip.
    #[error("Message rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        recipient: &Recipient,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageHandle, TransportError>;

    async fn edit(
        &self,
        message: &MessageHandle,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), TransportError>;

    async fn delete(&self, message: &MessageHandle) -> Result<(), TransportError>;
}
