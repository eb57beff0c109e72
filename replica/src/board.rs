//! Board metadata from the persistence collaborator and session id derivation.

use serde::{Deserialize, Serialize};

/// Board record as looked up once at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMeta {
    pub id: String,
    pub name: String,
    pub invite_code: String,
    pub creator_id: Option<String>,
}

impl BoardMeta {
    /// Replication session identifier. Both storage and presence are keyed by it,
    /// so every client of one board lands in the same session.
    #[must_use]
    pub fn session_id(&self) -> String {
        session_id_for(&self.id)
    }
}

#[must_use]
pub fn session_id_for(board_id: &str) -> String {
    format!("board-{board_id}")
}
