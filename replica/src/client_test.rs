use std::collections::BTreeMap;

use serde_json::json;

use super::*;
use crate::message::Welcome;
use crate::presence::{Cursor, UserInfo};

fn welcome(connection_id: ConnectionId) -> ServerMessage {
    ServerMessage::Welcome(Welcome {
        session_id: "board-1".into(),
        connection_id,
        clock: 10,
        snapshot: StorageSnapshot::default(),
        stamps: BTreeMap::new(),
        chat: Vec::new(),
        others: Vec::new(),
    })
}

fn connected() -> Replica {
    let mut r = Replica::default();
    r.receive(welcome(1));
    r.take_changed();
    r
}

// =============================================================
// connection status
// =============================================================

#[test]
fn new_replica_is_connecting_and_rejects_writes() {
    let mut r = Replica::default();
    assert_eq!(r.status(), Status::Connecting);
    assert!(matches!(r.set("a", json!(1)), Err(ReplicaError::Disconnected)));
}

#[test]
fn welcome_connects_and_loads_snapshot() {
    let mut r = Replica::default();
    let mut snapshot = StorageSnapshot::default();
    snapshot.canvas_objects.insert("a".into(), json!({"type": "circle"}));
    r.receive(ServerMessage::Welcome(Welcome {
        session_id: "board-9".into(),
        connection_id: 3,
        clock: 2,
        snapshot,
        stamps: BTreeMap::new(),
        chat: Vec::new(),
        others: Vec::new(),
    }));
    assert!(r.is_connected());
    assert_eq!(r.connection_id(), Some(3));
    assert_eq!(r.session_id(), Some("board-9"));
    assert!(r.get("a").is_some());
    assert!(r.take_changed());
}

#[test]
fn disconnect_makes_board_inert() {
    let mut r = connected();
    r.set("a", json!(1)).unwrap();
    r.disconnect();
    assert!(r.take_outbox().is_empty());
    assert!(matches!(r.set("b", json!(1)), Err(ReplicaError::Disconnected)));
    assert!(matches!(r.undo(), Err(ReplicaError::Disconnected)));
}

// =============================================================
// local writes
// =============================================================

#[test]
fn set_stamps_above_welcome_clock() {
    let mut r = connected();
    r.set("a", json!(1)).unwrap();
    let out = r.take_outbox();
    assert_eq!(out, vec![ClientMessage::StorageSet { key: "a".into(), value: json!(1), stamp: Stamp::new(11, 1) }]);
    assert!(r.take_changed());
}

#[test]
fn identical_set_is_skipped() {
    let mut r = connected();
    r.set("a", json!(1)).unwrap();
    r.take_outbox();
    r.set("a", json!(1)).unwrap();
    assert!(r.take_outbox().is_empty());
}

#[test]
fn delete_absent_key_returns_false() {
    let mut r = connected();
    assert!(!r.delete("nope").unwrap());
    assert!(r.take_outbox().is_empty());
}

#[test]
fn own_echo_is_a_noop() {
    let mut r = connected();
    r.set("a", json!(1)).unwrap();
    let ClientMessage::StorageSet { key, value, stamp } = r.take_outbox().remove(0) else {
        panic!("expected storage set");
    };
    r.take_changed();
    r.receive(ServerMessage::StorageSet { key, value, stamp, origin: 1 });
    assert!(!r.take_changed());
}

// =============================================================
// remote writes
// =============================================================

#[test]
fn remote_set_marks_changed_and_advances_clock() {
    let mut r = connected();
    r.receive(ServerMessage::StorageSet { key: "x".into(), value: json!(1), stamp: Stamp::new(50, 2), origin: 2 });
    assert!(r.take_changed());
    r.set("y", json!(1)).unwrap();
    let out = r.take_outbox();
    assert!(matches!(&out[0], ClientMessage::StorageSet { stamp, .. } if stamp.clock == 51));
}

#[test]
fn later_remote_write_wins_without_merge() {
    let mut r = connected();
    r.set("x", json!({"left": 1, "fill": "red"})).unwrap();
    r.receive(ServerMessage::StorageSet {
        key: "x".into(),
        value: json!({"left": 9}),
        stamp: Stamp::new(99, 2),
        origin: 2,
    });
    assert_eq!(r.get("x"), Some(&json!({"left": 9})));
}

#[test]
fn remote_delete_removes_key() {
    let mut r = connected();
    r.set("x", json!(1)).unwrap();
    r.receive(ServerMessage::StorageDelete { key: "x".into(), stamp: Stamp::new(99, 2), origin: 2 });
    assert!(r.get("x").is_none());
}

// =============================================================
// undo / redo
// =============================================================

#[test]
fn undo_and_redo_send_fresh_writes() {
    let mut r = connected();
    r.set("a", json!(1)).unwrap();
    r.take_outbox();

    assert!(r.undo().unwrap());
    assert!(r.get("a").is_none());
    assert!(matches!(r.take_outbox().as_slice(), [ClientMessage::StorageDelete { .. }]));

    assert!(r.redo().unwrap());
    assert_eq!(r.get("a"), Some(&json!(1)));
    assert!(matches!(r.take_outbox().as_slice(), [ClientMessage::StorageSet { .. }]));
}

#[test]
fn batch_undoes_all_keys() {
    let mut r = connected();
    r.begin_batch();
    r.set("bg", json!(1)).unwrap();
    r.set("text", json!(2)).unwrap();
    r.end_batch();
    assert!(r.undo().unwrap());
    assert!(r.document().is_empty());
    assert!(!r.undo().unwrap());
}

#[test]
fn remote_writes_are_not_undoable() {
    let mut r = connected();
    r.receive(ServerMessage::StorageSet { key: "x".into(), value: json!(1), stamp: Stamp::new(20, 2), origin: 2 });
    assert!(!r.can_undo());
}

// =============================================================
// presence / chat
// =============================================================

#[test]
fn presence_is_queued_but_not_stored() {
    let mut r = connected();
    let p = Presence { cursor: Some(Cursor { x: 3, y: 4 }), selection: None };
    r.update_presence(p.clone());
    assert_eq!(r.take_outbox(), vec![ClientMessage::PresenceUpdate { presence: p }]);
    assert!(r.document().is_empty());
    assert!(!r.can_undo());
}

#[test]
fn repeated_presence_is_deduplicated() {
    let mut r = connected();
    let p = Presence { cursor: Some(Cursor { x: 3, y: 4 }), selection: None };
    r.update_presence(p.clone());
    r.update_presence(p);
    assert_eq!(r.take_outbox().len(), 1);
}

#[test]
fn presence_from_others_is_tracked() {
    let mut r = connected();
    r.receive(ServerMessage::PresenceUpdate {
        connection_id: 2,
        user: Some(UserInfo::new("u2", "Bo")),
        presence: Presence::default(),
    });
    assert_eq!(r.others().count(), 1);
    r.receive(ServerMessage::PresenceLeft { connection_id: 2 });
    assert_eq!(r.others().count(), 0);
}

#[test]
fn own_presence_echo_is_ignored() {
    let mut r = connected();
    r.receive(ServerMessage::PresenceUpdate { connection_id: 1, user: None, presence: Presence::default() });
    assert_eq!(r.others().count(), 0);
}

#[test]
fn chat_validates_before_queueing() {
    let mut r = connected();
    assert!(r.append_chat("   ").is_err());
    r.append_chat(" hi ").unwrap();
    assert_eq!(r.take_outbox(), vec![ClientMessage::ChatAppend { text: "hi".into() }]);
    assert!(r.chat().is_empty());
}

#[test]
fn relay_error_is_remembered() {
    let mut r = connected();
    r.receive(ServerMessage::Error { code: "E_X".into(), message: "boom".into() });
    assert_eq!(r.last_error(), Some(("E_X", "boom")));
}
