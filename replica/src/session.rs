//! Relay-side hub for one board.
//!
//! DESIGN
//! ======
//! The session owns the authoritative document, the presence of every
//! connection, and the chat log. Handlers are pure: they validate, mutate the
//! session, and return [`Delivery`] values describing who receives what. The
//! transport layer owns the sockets and fans deliveries out.
//!
//! STORAGE
//! =======
//! Accepted writes are broadcast to every connection, the author included;
//! that echo is how the author learns its write won. A write that loses to a
//! newer stamp is answered, to the author only, with the current winner so its
//! optimistic copy converges. Writes to different keys carry no ordering
//! guarantee relative to each other, and a multi-object edit arrives as
//! independent writes.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tracing::{debug, info};

use crate::ConnectionId;
use crate::chat::{ChatLog, DEFAULT_MAX_LEN};
use crate::document::{ReplicatedDocument, Stamp};
use crate::error::ReplicaError;
use crate::message::{ClientMessage, ServerMessage, Welcome};
use crate::presence::{PresenceMap, UserInfo};

/// Who a [`Delivery`] goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection, the sender included.
    All,
    /// Every connection except the given one.
    AllExcept(ConnectionId),
    /// A single connection.
    Only(ConnectionId),
}

impl Recipient {
    #[must_use]
    pub fn includes(self, connection_id: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::AllExcept(id) => id != connection_id,
            Self::Only(id) => id == connection_id,
        }
    }
}

/// One outbound message and its audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Delivery {
    fn new(to: Recipient, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

pub struct Session {
    id: String,
    document: ReplicatedDocument,
    presence: PresenceMap,
    chat: ChatLog,
    next_connection: ConnectionId,
    clock: u64,
}

impl Session {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_chat_limit(id, DEFAULT_MAX_LEN)
    }

    #[must_use]
    pub fn with_chat_limit(id: impl Into<String>, chat_max_len: usize) -> Self {
        Self {
            id: id.into(),
            document: ReplicatedDocument::new(),
            presence: PresenceMap::new(),
            chat: ChatLog::new(chat_max_len),
            next_connection: 1,
            clock: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn document(&self) -> &ReplicatedDocument {
        &self.document
    }

    #[must_use]
    pub fn presence(&self) -> &PresenceMap {
        &self.presence
    }

    #[must_use]
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Number of open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.presence.len()
    }

    // =========================================================================
    // JOIN / PART
    // =========================================================================

    /// Admit a new connection.
    ///
    /// Returns its id, the welcome to send it, and the announcement for peers.
    pub fn join(&mut self, user: Option<UserInfo>) -> (ConnectionId, Welcome, Vec<Delivery>) {
        let connection_id = self.next_connection;
        self.next_connection += 1;

        let others = self.presence.iter().cloned().collect();
        self.presence.join(connection_id, user.clone());

        let welcome = Welcome {
            session_id: self.id.clone(),
            connection_id,
            clock: self.clock,
            snapshot: self.document.snapshot(),
            stamps: self.document.stamps(),
            chat: self.chat.messages().to_vec(),
            others,
        };

        info!(session = %self.id, connection_id, objects = self.document.len(), "session: join");

        let announce = ServerMessage::PresenceUpdate {
            connection_id,
            user,
            presence: crate::presence::Presence::default(),
        };
        (connection_id, welcome, vec![Delivery::new(Recipient::AllExcept(connection_id), announce)])
    }

    /// Drop a connection and tell the others. Unknown ids produce nothing.
    pub fn part(&mut self, connection_id: ConnectionId) -> Vec<Delivery> {
        if self.presence.remove(connection_id).is_none() {
            return Vec::new();
        }
        info!(session = %self.id, connection_id, "session: part");
        vec![Delivery::new(Recipient::AllExcept(connection_id), ServerMessage::PresenceLeft { connection_id })]
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Apply one client message.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::UnknownConnection`] if `connection_id` never
    /// joined, and chat validation errors for bad chat text.
    pub fn handle(&mut self, connection_id: ConnectionId, message: ClientMessage) -> Result<Vec<Delivery>, ReplicaError> {
        if self.presence.get(connection_id).is_none() {
            return Err(ReplicaError::UnknownConnection(connection_id));
        }

        match message {
            ClientMessage::StorageSet { key, value, stamp } => Ok(self.handle_set(connection_id, key, value, stamp)),
            ClientMessage::StorageDelete { key, stamp } => Ok(self.handle_delete(connection_id, key, stamp)),
            ClientMessage::PresenceUpdate { presence } => {
                self.presence.update(connection_id, None, presence.clone());
                let user = self.presence.get(connection_id).and_then(|p| p.user.clone());
                Ok(vec![Delivery::new(
                    Recipient::AllExcept(connection_id),
                    ServerMessage::PresenceUpdate { connection_id, user, presence },
                )])
            }
            ClientMessage::ChatAppend { text } => {
                let sender = self
                    .presence
                    .get(connection_id)
                    .and_then(|p| p.user.clone())
                    .unwrap_or_else(|| UserInfo::anonymous(connection_id));
                let message = self.chat.append(&text, sender, crate::now_ms())?.clone();
                debug!(session = %self.id, connection_id, id = %message.id, "session: chat appended");
                Ok(vec![Delivery::new(Recipient::All, ServerMessage::ChatAppended { message })])
            }
        }
    }

    fn observe(&mut self, stamp: Stamp) {
        self.clock = self.clock.max(stamp.clock);
    }

    fn handle_set(
        &mut self,
        connection_id: ConnectionId,
        key: String,
        value: serde_json::Value,
        stamp: Stamp,
    ) -> Vec<Delivery> {
        self.observe(stamp);
        if self.document.set(key.clone(), value.clone(), stamp) {
            debug!(session = %self.id, connection_id, %key, clock = stamp.clock, "session: storage set");
            return vec![Delivery::new(
                Recipient::All,
                ServerMessage::StorageSet { key, value, stamp, origin: connection_id },
            )];
        }
        self.current_winner(connection_id, key)
    }

    fn handle_delete(&mut self, connection_id: ConnectionId, key: String, stamp: Stamp) -> Vec<Delivery> {
        self.observe(stamp);
        if self.document.delete(key.clone(), stamp) {
            debug!(session = %self.id, connection_id, %key, clock = stamp.clock, "session: storage delete");
            return vec![Delivery::new(
                Recipient::All,
                ServerMessage::StorageDelete { key, stamp, origin: connection_id },
            )];
        }
        self.current_winner(connection_id, key)
    }

    /// Tell a losing writer what the key currently holds.
    fn current_winner(&self, connection_id: ConnectionId, key: String) -> Vec<Delivery> {
        let stamp = self.document.stamp(&key).unwrap_or_default();
        debug!(session = %self.id, connection_id, %key, "session: stale write rejected");
        let message = match self.document.get(&key) {
            Some(value) => ServerMessage::StorageSet { key, value: value.clone(), stamp, origin: stamp.connection },
            None => ServerMessage::StorageDelete { key, stamp, origin: stamp.connection },
        };
        vec![Delivery::new(Recipient::Only(connection_id), message)]
    }
}
