//! Client-side replica of a board session.
//!
//! Local writes apply immediately, get the next Lamport stamp, and queue a
//! message in the outbox for the transport to send. Remote writes pass through
//! the same last-writer-wins rule, so the local copy converges on whatever the
//! relay settles on. The echo of our own write finds an identical stamp and is
//! a no-op.
//!
//! While the transport is down every write fails with
//! [`ReplicaError::Disconnected`]; nothing is queued for later.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ConnectionId;
use crate::chat::{self, ChatLog, ChatMessage};
use crate::document::{ReplicatedDocument, Stamp, StorageSnapshot};
use crate::error::ReplicaError;
use crate::history::{DEFAULT_HISTORY_LIMIT, History, Write};
use crate::message::{ClientMessage, ServerMessage};
use crate::presence::{Peer, Presence, PresenceMap};

/// Transport state as seen by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Waiting for the welcome.
    #[default]
    Connecting,
    Connected,
    /// Lost the relay; the board is inert until a new welcome arrives.
    Disconnected,
}

pub struct Replica {
    status: Status,
    session_id: Option<String>,
    connection_id: Option<ConnectionId>,
    clock: u64,
    document: ReplicatedDocument,
    history: History,
    others: PresenceMap,
    chat: ChatLog,
    presence: Presence,
    outbox: Vec<ClientMessage>,
    changed: bool,
    last_error: Option<(String, String)>,
}

impl Default for Replica {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl Replica {
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            status: Status::Connecting,
            session_id: None,
            connection_id: None,
            clock: 0,
            document: ReplicatedDocument::new(),
            history: History::new(history_limit),
            others: PresenceMap::new(),
            chat: ChatLog::default(),
            presence: Presence::default(),
            outbox: Vec::new(),
            changed: false,
            last_error: None,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == Status::Connected
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    #[must_use]
    pub fn document(&self) -> &ReplicatedDocument {
        &self.document
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    #[must_use]
    pub fn snapshot(&self) -> StorageSnapshot {
        self.document.snapshot()
    }

    /// Other participants, in connection-id order.
    pub fn others(&self) -> impl Iterator<Item = &Peer> {
        self.others.iter()
    }

    #[must_use]
    pub fn chat(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Last `session:error` received, as `(code, message)`.
    #[must_use]
    pub fn last_error(&self) -> Option<(&str, &str)> {
        self.last_error.as_ref().map(|(c, m)| (c.as_str(), m.as_str()))
    }

    // --- Transport ---

    /// Messages waiting to go out, in the order they were produced.
    pub fn take_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Whether the document changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    /// The transport dropped. Peers vanish, queued messages are discarded.
    pub fn disconnect(&mut self) {
        if self.status != Status::Disconnected {
            warn!(connection_id = ?self.connection_id, dropped = self.outbox.len(), "replica: disconnected");
        }
        self.status = Status::Disconnected;
        self.outbox.clear();
        self.others.clear();
    }

    /// Apply one relay message.
    pub fn receive(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Welcome(welcome) => {
                info!(
                    session = %welcome.session_id,
                    connection_id = welcome.connection_id,
                    objects = welcome.snapshot.canvas_objects.len(),
                    "replica: welcome"
                );
                self.document = ReplicatedDocument::from_snapshot(welcome.snapshot, &welcome.stamps);
                self.clock = welcome.clock.max(self.document.max_clock());
                self.session_id = Some(welcome.session_id);
                self.connection_id = Some(welcome.connection_id);
                self.status = Status::Connected;
                self.chat.replace(welcome.chat);
                self.others.clear();
                for peer in welcome.others {
                    self.others.update(peer.connection_id, peer.user, peer.presence);
                }
                self.history.clear();
                self.changed = true;
                if self.presence != Presence::default() {
                    self.outbox.push(ClientMessage::PresenceUpdate { presence: self.presence.clone() });
                }
            }
            ServerMessage::StorageSet { key, value, stamp, origin } => {
                self.observe(stamp);
                if self.document.set(key.clone(), value, stamp) {
                    debug!(%key, origin, "replica: remote set");
                    self.changed = true;
                }
            }
            ServerMessage::StorageDelete { key, stamp, origin } => {
                self.observe(stamp);
                if self.document.delete(key.clone(), stamp) {
                    debug!(%key, origin, "replica: remote delete");
                    self.changed = true;
                }
            }
            ServerMessage::PresenceUpdate { connection_id, user, presence } => {
                if Some(connection_id) != self.connection_id {
                    self.others.update(connection_id, user, presence);
                }
            }
            ServerMessage::PresenceLeft { connection_id } => {
                self.others.remove(connection_id);
            }
            ServerMessage::ChatAppended { message } => {
                self.chat.push(message);
            }
            ServerMessage::Error { code, message } => {
                warn!(%code, %message, "replica: relay error");
                self.last_error = Some((code, message));
            }
        }
    }

    // --- Storage writes ---

    /// Write `value` under `key` and record it in history.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Disconnected`] when the transport is down.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ReplicaError> {
        self.ensure_connected()?;
        if self.document.get(key) == Some(&value) {
            return Ok(());
        }
        self.history.record(key, self.document.get(key).cloned());
        self.write(key, Some(value))
    }

    /// Delete `key` and record it in history. Returns `false` if it was absent.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Disconnected`] when the transport is down.
    pub fn delete(&mut self, key: &str) -> Result<bool, ReplicaError> {
        self.ensure_connected()?;
        let Some(previous) = self.document.get(key).cloned() else {
            return Ok(false);
        };
        self.history.record(key, Some(previous));
        self.write(key, None)?;
        Ok(true)
    }

    /// Group the following writes into one undo step.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Undo the last committed step. Returns `false` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Disconnected`] when the transport is down.
    pub fn undo(&mut self) -> Result<bool, ReplicaError> {
        self.ensure_connected()?;
        let document = &self.document;
        let Some(step) = self.history.undo(|k| document.get(k).cloned()) else {
            return Ok(false);
        };
        self.replay(step)?;
        Ok(true)
    }

    /// Redo the last undone step. Returns `false` if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Disconnected`] when the transport is down.
    pub fn redo(&mut self) -> Result<bool, ReplicaError> {
        self.ensure_connected()?;
        let document = &self.document;
        let Some(step) = self.history.redo(|k| document.get(k).cloned()) else {
            return Ok(false);
        };
        self.replay(step)?;
        Ok(true)
    }

    fn replay(&mut self, step: Vec<Write>) -> Result<(), ReplicaError> {
        for w in step {
            if self.document.get(&w.key) == w.value.as_ref() {
                continue;
            }
            self.write(&w.key, w.value)?;
        }
        Ok(())
    }

    fn write(&mut self, key: &str, value: Option<Value>) -> Result<(), ReplicaError> {
        let stamp = self.next_stamp()?;
        match value {
            Some(value) => {
                self.document.set(key, value.clone(), stamp);
                self.outbox.push(ClientMessage::StorageSet { key: key.to_string(), value, stamp });
            }
            None => {
                self.document.delete(key, stamp);
                self.outbox.push(ClientMessage::StorageDelete { key: key.to_string(), stamp });
            }
        }
        self.changed = true;
        Ok(())
    }

    // --- Presence / chat ---

    /// Replace this client's presence and broadcast it. Dropped while disconnected.
    pub fn update_presence(&mut self, presence: Presence) {
        if self.presence == presence {
            return;
        }
        self.presence = presence;
        if self.is_connected() {
            self.outbox.push(ClientMessage::PresenceUpdate { presence: self.presence.clone() });
        }
    }

    /// Queue a chat message. It appears locally once the relay broadcasts it.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Disconnected`] or a chat validation error.
    pub fn append_chat(&mut self, text: &str) -> Result<(), ReplicaError> {
        self.ensure_connected()?;
        let text = chat::validate(text, self.chat.max_len())?.to_string();
        self.outbox.push(ClientMessage::ChatAppend { text });
        Ok(())
    }

    // --- Clock ---

    fn ensure_connected(&self) -> Result<(), ReplicaError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ReplicaError::Disconnected)
        }
    }

    fn observe(&mut self, stamp: Stamp) {
        self.clock = self.clock.max(stamp.clock);
    }

    fn next_stamp(&mut self) -> Result<Stamp, ReplicaError> {
        let connection = self.connection_id.ok_or(ReplicaError::Disconnected)?;
        self.clock += 1;
        Ok(Stamp::new(self.clock, connection))
    }
}
