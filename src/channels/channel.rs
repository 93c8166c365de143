//! Channel trait and the message units flowing through it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::ChannelError;

/// Longest text sent as a single outbound unit.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// One inbound message from a user.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Transport-provided numeric identity (Telegram chat id).
    pub user_id: i64,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// One outbound message to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub user_id: i64,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
        }
    }

    /// Split long text into ordered units of at most `MAX_MESSAGE_CHARS`.
    pub fn chunked(user_id: i64, text: &str) -> Vec<Self> {
        split_message(text, MAX_MESSAGE_CHARS)
            .into_iter()
            .map(|chunk| Self::new(user_id, chunk))
            .collect()
    }
}

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A transport the bot talks through.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Start receiving. Messages arrive in order on the returned stream.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver one outbound unit.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), ChannelError>;

    /// Verify the transport is reachable.
    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

/// Split a message into chunks of at most `max_chars` characters.
/// Tries to split on newlines, then spaces, then hard-cuts.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset just past the first `max_chars` characters.
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}
