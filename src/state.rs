//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the relay config and a map of live boards. Each board owns the
//! authoritative `replica::Session` and the outbox of every connected client.

use std::collections::HashMap;
use std::sync::Arc;

use replica::ConnectionId;
use replica::message::ServerMessage;
use replica::session::Session;
use tokio::sync::{RwLock, mpsc};

use crate::config::Config;

// =============================================================================
// BOARD STATE
// =============================================================================

/// Per-board live state, kept in memory while the relay runs.
pub struct BoardState {
    pub session: Session,
    /// Connected clients: connection id -> sender for outgoing messages.
    pub clients: HashMap<ConnectionId, mpsc::Sender<ServerMessage>>,
}

impl BoardState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session, clients: HashMap::new() }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; all inner fields are
/// Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Keyed by board id (not session id).
    pub boards: Arc<RwLock<HashMap<String, BoardState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config), boards: Arc::new(RwLock::new(HashMap::new())) }
    }
}
