//! Presence overlay: publishing our cursor and drawing everyone else's.
//!
//! Cursor positions travel in world coordinates rounded to whole units, so a
//! peer with a different pan/zoom sees the pointer over the same object.
//! Presence goes through the replica's ephemeral channel only; it never
//! touches the document or undo history.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use replica::ConnectionId;
use replica::client::Replica;
use replica::presence::{Cursor, Presence};

use crate::camera::Point;
use crate::consts::CURSOR_COLORS;
use crate::doc::{ObjectId, storage_key};

/// Stable palette color for a connection. Colors repeat once the palette runs out.
#[must_use]
pub fn cursor_color(connection_id: ConnectionId) -> &'static str {
    CURSOR_COLORS[connection_id as usize % CURSOR_COLORS.len()]
}

fn selection_of(ids: &[ObjectId]) -> Option<Vec<String>> {
    if ids.is_empty() { None } else { Some(ids.iter().map(storage_key).collect()) }
}

/// Publish the pointer position (or `None` when it left the canvas) together
/// with the current selection.
pub fn publish_cursor(replica: &mut Replica, world: Option<Point>, selection: &[ObjectId]) {
    let cursor = world.map(|p| Cursor::from_f64(p.x, p.y));
    replica.update_presence(Presence { cursor, selection: selection_of(selection) });
}

/// Publish a selection change, keeping the last cursor.
pub fn publish_selection(replica: &mut Replica, selection: &[ObjectId]) {
    let cursor = replica.presence().cursor;
    replica.update_presence(Presence { cursor, selection: selection_of(selection) });
}

/// A remote pointer to draw, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorGlyph {
    pub connection_id: ConnectionId,
    pub world: Point,
    pub color: &'static str,
    pub label: String,
}

/// Every other participant with a cursor on the canvas, by connection id.
#[must_use]
pub fn cursor_glyphs(replica: &Replica) -> Vec<CursorGlyph> {
    replica
        .others()
        .filter_map(|peer| {
            let cursor = peer.presence.cursor?;
            #[allow(clippy::cast_precision_loss)]
            let world = Point::new(cursor.x as f64, cursor.y as f64);
            Some(CursorGlyph {
                connection_id: peer.connection_id,
                world,
                color: cursor_color(peer.connection_id),
                label: peer.display_name().to_string(),
            })
        })
        .collect()
}

