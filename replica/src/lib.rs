//! Replicated board storage shared by the relay server and the canvas client.
//!
//! A board session is a last-writer-wins map from object id to serialized
//! shape, plus ephemeral per-connection presence and an append-only chat log.
//! The relay holds the authoritative [`session::Session`]; each browser holds a
//! [`client::Replica`] that writes optimistically and converges on the relay's
//! broadcasts.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | LWW map, stamps, storage snapshot |
//! | [`history`] | Linear undo/redo over committed writes |
//! | [`presence`] | Cursor/selection presence and user identity |
//! | [`chat`] | Append-only chat log |
//! | [`message`] | Wire messages and JSON codec |
//! | [`session`] | Relay-side hub, one per board |
//! | [`client`] | Client-side replica |
//! | [`board`] | Board metadata and session id derivation |
//! | [`error`] | Error type and grepable codes |

pub mod board;
pub mod chat;
pub mod client;
pub mod document;
pub mod error;
pub mod history;
pub mod message;
pub mod presence;
pub mod session;

/// Small integer identifying one connection within a session.
pub type ConnectionId = u32;

pub use error::ReplicaError;

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
