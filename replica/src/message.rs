//! Wire messages between a client replica and the relay.
//!
//! Messages are adjacently tagged JSON: `{"syscall": "storage:set", "data": {...}}`.
//! The `syscall` prefix (`storage`, `presence`, `chat`, `session`) names the
//! concern; the relay routes on it and never inspects shape payloads.

#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConnectionId;
use crate::chat::ChatMessage;
use crate::document::{Stamp, StorageSnapshot};
use crate::error::ReplicaError;
use crate::presence::{Peer, Presence, UserInfo};

/// Client → relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "syscall", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "storage:set")]
    StorageSet { key: String, value: Value, stamp: Stamp },
    #[serde(rename = "storage:delete")]
    StorageDelete { key: String, stamp: Stamp },
    #[serde(rename = "presence:update")]
    PresenceUpdate { presence: Presence },
    #[serde(rename = "chat:append")]
    ChatAppend { text: String },
}

impl ClientMessage {
    /// Namespaced operation name, e.g. `"storage:set"`.
    #[must_use]
    pub fn syscall(&self) -> &'static str {
        match self {
            Self::StorageSet { .. } => "storage:set",
            Self::StorageDelete { .. } => "storage:delete",
            Self::PresenceUpdate { .. } => "presence:update",
            Self::ChatAppend { .. } => "chat:append",
        }
    }
}

/// Everything a client needs to start: its id, clock floor, and current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    pub session_id: String,
    pub connection_id: ConnectionId,
    /// Highest clock seen by the relay; the client starts above it.
    pub clock: u64,
    pub snapshot: StorageSnapshot,
    pub stamps: BTreeMap<String, Stamp>,
    pub chat: Vec<ChatMessage>,
    pub others: Vec<Peer>,
}

/// Relay → client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "syscall", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "session:welcome")]
    Welcome(Welcome),
    #[serde(rename = "storage:set")]
    StorageSet { key: String, value: Value, stamp: Stamp, origin: ConnectionId },
    #[serde(rename = "storage:delete")]
    StorageDelete { key: String, stamp: Stamp, origin: ConnectionId },
    #[serde(rename = "presence:update")]
    PresenceUpdate { connection_id: ConnectionId, user: Option<UserInfo>, presence: Presence },
    #[serde(rename = "presence:left")]
    PresenceLeft { connection_id: ConnectionId },
    #[serde(rename = "chat:appended")]
    ChatAppended { message: ChatMessage },
    #[serde(rename = "session:error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    /// Build an error message from a typed error.
    #[must_use]
    pub fn error_from(err: &ReplicaError) -> Self {
        Self::Error { code: err.error_code().to_string(), message: err.to_string() }
    }

    /// Whether this message is ephemeral presence traffic.
    #[must_use]
    pub fn is_presence(&self) -> bool {
        matches!(self, Self::PresenceUpdate { .. } | Self::PresenceLeft { .. })
    }
}

/// Encode any wire message as JSON text.
///
/// # Errors
///
/// Returns [`ReplicaError::Codec`] if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<String, ReplicaError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a client message from JSON text.
///
/// # Errors
///
/// Returns [`ReplicaError::Codec`] for malformed or unknown messages.
pub fn decode_client(text: &str) -> Result<ClientMessage, ReplicaError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a relay message from JSON text.
///
/// # Errors
///
/// Returns [`ReplicaError::Codec`] for malformed or unknown messages.
pub fn decode_server(text: &str) -> Result<ServerMessage, ReplicaError> {
    Ok(serde_json::from_str(text)?)
}
