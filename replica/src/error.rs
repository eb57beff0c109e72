//! Errors raised by the replicated store.

use crate::ConnectionId;

#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    /// The replication transport is down; the board is read-only until it returns.
    #[error("replication transport is not connected")]
    Disconnected,
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
    #[error("chat message is empty")]
    EmptyMessage,
    #[error("chat message too long: {len} > {max}")]
    MessageTooLong { len: usize, max: usize },
    #[error("message codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}

impl ReplicaError {
    /// Grepable error code carried on `session:error` messages.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Disconnected => "E_DISCONNECTED",
            Self::UnknownConnection(_) => "E_UNKNOWN_CONNECTION",
            Self::EmptyMessage => "E_EMPTY_MESSAGE",
            Self::MessageTooLong { .. } => "E_MESSAGE_TOO_LONG",
            Self::Codec(_) => "E_CODEC",
        }
    }
}
