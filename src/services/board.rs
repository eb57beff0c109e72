//! Board service: one replication session per board, fanned out to sockets.
//!
//! DESIGN
//! ======
//! The session decides who receives what (`Delivery`); this module only owns
//! the outboxes and pushes each delivery into the matching ones. Sends are
//! `try_send` so one slow client never stalls the board; see [`fan_out`]
//! for what happens when an outbox is full. Boards live in memory for the
//! lifetime of the relay; a board is evicted only when its last client leaves
//! and it holds no objects and no chat.

use replica::ConnectionId;
use replica::ReplicaError;
use replica::board::session_id_for;
use replica::message::{ClientMessage, ServerMessage, Welcome};
use replica::presence::UserInfo;
use replica::session::{Delivery, Session};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::state::{AppState, BoardState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("board not live: {0}")]
    NotLive(String),
    #[error(transparent)]
    Replica(#[from] ReplicaError),
}

impl BoardError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotLive(_) => "E_BOARD_NOT_LIVE",
            Self::Replica(e) => e.error_code(),
        }
    }

    /// `session:error` frame for the sender.
    #[must_use]
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::Error { code: self.error_code().to_string(), message: self.to_string() }
    }
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Register a client on a board, creating the board's session on first use.
/// Returns the new connection id and the welcome for that client; peers are
/// told about the arrival.
pub async fn join_board(
    state: &AppState,
    board_id: &str,
    user: Option<UserInfo>,
    tx: mpsc::Sender<ServerMessage>,
) -> (ConnectionId, Welcome) {
    let mut boards = state.boards.write().await;
    let board = boards.entry(board_id.to_string()).or_insert_with(|| {
        info!(%board_id, "board: opened session");
        BoardState::new(Session::with_chat_limit(session_id_for(board_id), state.config.chat_max_len))
    });

    let (connection_id, welcome, deliveries) = board.session.join(user);
    board.clients.insert(connection_id, tx);
    info!(%board_id, connection_id, clients = board.clients.len(), "board: client joined");
    fan_out(board_id, board, deliveries);
    (connection_id, welcome)
}

/// Remove a client and tell its peers. Evicts an empty board.
pub async fn part_board(state: &AppState, board_id: &str, connection_id: ConnectionId) {
    let mut boards = state.boards.write().await;
    let Some(board) = boards.get_mut(board_id) else {
        return;
    };

    board.clients.remove(&connection_id);
    let deliveries = board.session.part(connection_id);
    fan_out(board_id, board, deliveries);
    info!(%board_id, connection_id, remaining = board.clients.len(), "board: client left");

    if board.clients.is_empty() && board.session.document().is_empty() && board.session.chat().is_empty() {
        boards.remove(board_id);
        info!(%board_id, "board: evicted empty board");
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Apply one client message to the board's session and fan out the result.
///
/// # Errors
///
/// Returns [`BoardError::NotLive`] if the board has no session, and the
/// session's own errors (unknown connection, bad chat text).
pub async fn handle_message(
    state: &AppState,
    board_id: &str,
    connection_id: ConnectionId,
    message: ClientMessage,
) -> Result<(), BoardError> {
    let syscall = message.syscall();
    let mut boards = state.boards.write().await;
    let board = boards.get_mut(board_id).ok_or_else(|| BoardError::NotLive(board_id.to_string()))?;
    let deliveries = board.session.handle(connection_id, message)?;
    if syscall != "presence:update" {
        debug!(%board_id, connection_id, syscall, deliveries = deliveries.len(), "board: handled");
    }
    fan_out(board_id, board, deliveries);
    Ok(())
}

/// Push each delivery into every outbox it addresses.
///
/// A full outbox may lose presence, which the next cursor move replaces.
/// Losing a storage or chat message would leave that client diverged for
/// good, so such a client is dropped instead: its sender goes away, its
/// socket loop ends, and it rejoins to a fresh welcome snapshot. Peers are
/// told it left, which may in turn overflow another outbox.
fn fan_out(board_id: &str, board: &mut BoardState, deliveries: Vec<Delivery>) {
    let mut pending = deliveries;
    while !pending.is_empty() {
        let mut lagging: Vec<ConnectionId> = Vec::new();
        for delivery in pending {
            for (&connection_id, tx) in &board.clients {
                if !delivery.to.includes(connection_id) || lagging.contains(&connection_id) {
                    continue;
                }
                match tx.try_send(delivery.message.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) if delivery.message.is_presence() => {
                        debug!(%board_id, connection_id, "board: outbox full; presence dropped");
                    }
                    Err(TrySendError::Full(_)) => {
                        warn!(%board_id, connection_id, "board: outbox full; dropping lagging client");
                        lagging.push(connection_id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(%board_id, connection_id, "board: outbox closed");
                    }
                }
            }
        }

        pending = Vec::new();
        for connection_id in lagging {
            if board.clients.remove(&connection_id).is_some() {
                pending.extend(board.session.part(connection_id));
            }
        }
    }
}

/// Number of clients on a live board, 0 if the board is not live.
pub async fn client_count(state: &AppState, board_id: &str) -> usize {
    let boards = state.boards.read().await;
    boards.get(board_id).map_or(0, |b| b.clients.len())
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;
