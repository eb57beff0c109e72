//! Append-only chat log.
//!
//! Messages are never edited or removed. The relay assigns ids and timestamps
//! and fixes the order; clients append what the relay broadcasts.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReplicaError;
use crate::presence::UserInfo;

/// Default cap on message length, in characters.
pub const DEFAULT_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: UserInfo,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Trim and check a message body.
///
/// # Errors
///
/// Returns [`ReplicaError::EmptyMessage`] for blank text and
/// [`ReplicaError::MessageTooLong`] when over `max_len` characters.
pub fn validate(text: &str, max_len: usize) -> Result<&str, ReplicaError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReplicaError::EmptyMessage);
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(ReplicaError::MessageTooLong { len, max: max_len });
    }
    Ok(trimmed)
}

#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    max_len: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

impl ChatLog {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self { messages: Vec::new(), max_len }
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Create and append a new message.
    ///
    /// # Errors
    ///
    /// Propagates [`validate`] failures; nothing is appended on error.
    pub fn append(&mut self, text: &str, sender: UserInfo, created_at: i64) -> Result<&ChatMessage, ReplicaError> {
        let text = validate(text, self.max_len)?.to_string();
        let index = self.messages.len();
        self.messages.push(ChatMessage { id: Uuid::new_v4(), text, sender, created_at });
        Ok(&self.messages[index])
    }

    /// Append a message created elsewhere. Duplicates (same id) are ignored.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Replace the whole log, used when a welcome carries history.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
