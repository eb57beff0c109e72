//! WebSocket handler: one socket per client per board.
//!
//! DESIGN
//! ======
//! On upgrade the client joins the board's session and receives
//! `session:welcome` with the current snapshot. The connection then runs a
//! `select!` loop:
//! - Incoming text frames are decoded as `ClientMessage` and applied to the
//!   session; the board service fans the results out.
//! - Messages queued in this client's outbox are encoded and sent. If the
//!   board closes the outbox the socket is closed too, and the client
//!   reconnects to a fresh welcome.
//!
//! Errors for a bad frame go to the sender only, as `session:error`.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade -> join -> send `session:welcome`
//! 2. Client frames -> session -> outboxes
//! 3. Close -> part -> peers get `presence:left`

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use replica::ConnectionId;
use replica::message::{self, ServerMessage};
use replica::presence::UserInfo;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let user = user_from_params(&params);
    ws.on_upgrade(move |socket| run_ws(socket, state, board_id, user))
}

/// Identity as passed by the shell: `?user_id=..&name=..[&avatar=..]`.
/// Missing id or name means an anonymous editor.
fn user_from_params(params: &HashMap<String, String>) -> Option<UserInfo> {
    let id = params.get("user_id").filter(|v| !v.is_empty())?;
    let name = params.get("name").filter(|v| !v.is_empty())?;
    Some(UserInfo {
        id: id.clone(),
        name: name.clone(),
        avatar: params.get("avatar").filter(|v| !v.is_empty()).cloned(),
    })
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, board_id: String, user: Option<UserInfo>) {
    let socket_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.config.outbox_capacity);

    let (connection_id, welcome) = services::board::join_board(&state, &board_id, user, tx).await;
    info!(%socket_id, %board_id, connection_id, "ws: client connected");

    if send_message(&mut socket, &ServerMessage::Welcome(welcome)).await.is_ok() {
        loop {
            tokio::select! {
                msg = socket.recv() => {
                    let Some(Ok(msg)) = msg else { break };
                    match msg {
                        Message::Text(text) => {
                            let replies = process_inbound_text(&state, &board_id, connection_id, text.as_str()).await;
                            if send_all(&mut socket, &replies).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                outbound = rx.recv() => {
                    // Closed when the board dropped this client for lagging.
                    let Some(outbound) = outbound else { break };
                    if send_message(&mut socket, &outbound).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    services::board::part_board(&state, &board_id, connection_id).await;
    info!(%socket_id, %board_id, connection_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and apply one inbound text frame. Returns the messages meant for
/// the sender alone (errors); everything else travels through outboxes.
async fn process_inbound_text(
    state: &AppState,
    board_id: &str,
    connection_id: ConnectionId,
    text: &str,
) -> Vec<ServerMessage> {
    let request = match message::decode_client(text) {
        Ok(request) => request,
        Err(e) => {
            warn!(%board_id, connection_id, error = %e, "ws: invalid inbound frame");
            return vec![ServerMessage::error_from(&e)];
        }
    };

    match services::board::handle_message(state, board_id, connection_id, request).await {
        Ok(()) => Vec::new(),
        Err(e) => {
            warn!(%board_id, connection_id, code = e.error_code(), error = %e, "ws: request rejected");
            vec![e.to_message()]
        }
    }
}

async fn send_all(socket: &mut WebSocket, messages: &[ServerMessage]) -> Result<(), axum::Error> {
    for message in messages {
        send_message(socket, message).await?;
    }
    Ok(())
}

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    match message::encode(message) {
        Ok(text) => socket.send(Message::Text(text.into())).await,
        Err(e) => {
            warn!(error = %e, "ws: failed to encode outbound message");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
