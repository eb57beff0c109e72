use std::collections::BTreeMap;

use replica::document::StorageSnapshot;
use replica::message::{ClientMessage, ServerMessage, Welcome};
use replica::presence::UserInfo;
use uuid::Uuid;

use super::*;

fn connected(connection_id: ConnectionId) -> Replica {
    let mut r = Replica::default();
    r.receive(ServerMessage::Welcome(Welcome {
        session_id: "board-1".into(),
        connection_id,
        clock: 0,
        snapshot: StorageSnapshot::default(),
        stamps: BTreeMap::new(),
        chat: Vec::new(),
        others: Vec::new(),
    }));
    r
}

#[test]
fn color_is_stable_and_wraps() {
    assert_eq!(cursor_color(3), cursor_color(3));
    assert_eq!(cursor_color(0), cursor_color(8));
    assert_ne!(cursor_color(0), cursor_color(1));
}

#[test]
fn publish_rounds_to_whole_pixels() {
    let mut r = connected(1);
    publish_cursor(&mut r, Some(Point::new(10.4, 19.6)), &[]);
    assert_eq!(r.presence().cursor, Some(Cursor { x: 10, y: 20 }));
    assert_eq!(r.presence().selection, None);
}

#[test]
fn leaving_publishes_null_cursor() {
    let mut r = connected(1);
    publish_cursor(&mut r, Some(Point::new(1.0, 1.0)), &[]);
    publish_cursor(&mut r, None, &[]);
    let out = r.take_outbox();
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[1], ClientMessage::PresenceUpdate { presence } if presence.cursor.is_none()));
}

#[test]
fn selection_update_keeps_cursor() {
    let mut r = connected(1);
    let id = Uuid::new_v4();
    publish_cursor(&mut r, Some(Point::new(3.0, 4.0)), &[]);
    publish_selection(&mut r, &[id]);
    assert_eq!(r.presence().cursor, Some(Cursor { x: 3, y: 4 }));
    assert_eq!(r.presence().selection, Some(vec![id.to_string()]));
}

#[test]
fn presence_never_enters_document_or_history() {
    let mut r = connected(1);
    publish_cursor(&mut r, Some(Point::new(3.0, 4.0)), &[Uuid::new_v4()]);
    assert!(r.document().is_empty());
    assert!(!r.can_undo());
}

#[test]
fn glyphs_skip_peers_without_cursor() {
    let mut r = connected(1);
    r.receive(ServerMessage::PresenceUpdate {
        connection_id: 2,
        user: Some(UserInfo::new("u2", "Bo")),
        presence: Presence { cursor: Some(Cursor { x: 5, y: 6 }), selection: Some(vec!["k".into()]) },
    });
    r.receive(ServerMessage::PresenceUpdate { connection_id: 3, user: None, presence: Presence::default() });

    let glyphs = cursor_glyphs(&r);
    assert_eq!(glyphs.len(), 1);
    assert_eq!(glyphs[0].label, "Bo");
    assert_eq!(glyphs[0].world, Point::new(5.0, 6.0));
    assert_eq!(glyphs[0].color, cursor_color(2));
}
