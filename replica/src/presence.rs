//! Ephemeral per-connection presence: cursor position and selection.
//!
//! Presence rides alongside the document but is never written into it,
//! never enters undo history, and disappears when its connection closes.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConnectionId;

/// Cursor position in whole world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: i64,
    pub y: i64,
}

impl Cursor {
    /// Round a fractional position to the nearest pixel.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self { x: x.round() as i64, y: y.round() as i64 }
    }
}

/// What one connection broadcasts about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub cursor: Option<Cursor>,
    pub selection: Option<Vec<String>>,
}

/// Identity supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserInfo {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), avatar: None }
    }

    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Stand-in identity for an editor with no session.
    #[must_use]
    pub fn anonymous(connection_id: ConnectionId) -> Self {
        Self::new(format!("anonymous-{connection_id}"), "Anonymous")
    }
}

/// Another participant as seen by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub connection_id: ConnectionId,
    pub user: Option<UserInfo>,
    pub presence: Presence,
}

impl Peer {
    /// Label shown next to this peer's cursor.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user.as_ref().map_or("Anonymous", |u| u.name.as_str())
    }
}

/// Presence of every connection in a session, keyed by connection id.
#[derive(Debug, Clone, Default)]
pub struct PresenceMap {
    peers: BTreeMap<ConnectionId, Peer>,
}

impl PresenceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with empty presence. Replaces any previous entry.
    pub fn join(&mut self, connection_id: ConnectionId, user: Option<UserInfo>) {
        self.peers
            .insert(connection_id, Peer { connection_id, user, presence: Presence::default() });
    }

    /// Replace a connection's presence, registering it if unseen.
    pub fn update(&mut self, connection_id: ConnectionId, user: Option<UserInfo>, presence: Presence) {
        let peer = self
            .peers
            .entry(connection_id)
            .or_insert_with(|| Peer { connection_id, user: None, presence: Presence::default() });
        if user.is_some() {
            peer.user = user;
        }
        peer.presence = presence;
    }

    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<Peer> {
        self.peers.remove(&connection_id)
    }

    #[must_use]
    pub fn get(&self, connection_id: ConnectionId) -> Option<&Peer> {
        self.peers.get(&connection_id)
    }

    /// Peers in connection-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
