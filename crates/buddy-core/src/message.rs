//! Conversation message types.
//!
//! Messages form an append-only history: a turn's user message is always
//! appended before its assistant (or error) counterpart, and history is
//! only ever cleared by a full session reset.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the learner.
    User,
    /// Message from the AI study buddy.
    Assistant,
    /// A failed turn, rendered in place of the assistant reply.
    Error,
}

/// Opaque, cheaply clonable reference to synthesized speech bytes.
///
/// Holding the handle is sufficient to replay the audio without re-fetching
/// it from the speech service.
#[derive(Clone)]
pub struct AudioHandle(Arc<Vec<u8>>);

impl AudioHandle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Arc::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AudioHandle")
            .field(&format!("{} bytes", self.0.len()))
            .finish()
    }
}

impl PartialEq for AudioHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for AudioHandle {}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Synthesized speech for assistant replies, when available.
    pub audio: Option<AudioHandle>,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl ChatMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, None)
    }

    /// Creates an assistant message with optional speech audio.
    pub fn assistant(content: impl Into<String>, audio: Option<AudioHandle>) -> Self {
        Self::new(MessageRole::Assistant, content, audio)
    }

    /// Creates an error message shown in place of a failed reply.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Error, content, None)
    }

    fn new(role: MessageRole, content: impl Into<String>, audio: Option<AudioHandle>) -> Self {
        Self {
            role,
            content: content.into(),
            audio,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
