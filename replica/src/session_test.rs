use serde_json::json;

use super::*;
use crate::presence::{Cursor, Presence};

fn set(key: &str, value: serde_json::Value, clock: u64, connection: ConnectionId) -> ClientMessage {
    ClientMessage::StorageSet { key: key.into(), value, stamp: Stamp::new(clock, connection) }
}

// =============================================================
// join / part
// =============================================================

#[test]
fn join_assigns_incrementing_ids() {
    let mut session = Session::new("board-1");
    let (a, _, _) = session.join(None);
    let (b, _, _) = session.join(None);
    assert_eq!((a, b), (1, 2));
    assert_eq!(session.connection_count(), 2);
}

#[test]
fn welcome_carries_snapshot_and_others() {
    let mut session = Session::new("board-1");
    let (a, _, _) = session.join(Some(UserInfo::new("u1", "Ada")));
    session.handle(a, set("obj", json!({"type": "rectangle"}), 4, a)).unwrap();

    let (b, welcome, announce) = session.join(None);
    assert_eq!(welcome.session_id, "board-1");
    assert_eq!(welcome.connection_id, b);
    assert_eq!(welcome.clock, 4);
    assert_eq!(welcome.snapshot.canvas_objects.len(), 1);
    assert_eq!(welcome.stamps.get("obj"), Some(&Stamp::new(4, a)));
    assert_eq!(welcome.others.len(), 1);
    assert_eq!(welcome.others[0].display_name(), "Ada");

    assert_eq!(announce.len(), 1);
    assert_eq!(announce[0].to, Recipient::AllExcept(b));
}

#[test]
fn part_announces_departure() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    let out = session.part(a);
    assert_eq!(out[0].message, ServerMessage::PresenceLeft { connection_id: a });
    assert!(session.part(a).is_empty());
}

#[test]
fn unknown_connection_is_rejected() {
    let mut session = Session::new("s");
    let err = session.handle(99, set("k", json!(1), 1, 99)).unwrap_err();
    assert!(matches!(err, ReplicaError::UnknownConnection(99)));
}

// =============================================================
// storage
// =============================================================

#[test]
fn accepted_set_is_broadcast_to_all() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    let out = session.handle(a, set("k", json!(1), 1, a)).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to, Recipient::All);
    assert_eq!(session.document().get("k"), Some(&json!(1)));
}

#[test]
fn stale_set_answers_author_with_winner() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    let (b, _, _) = session.join(None);
    session.handle(b, set("k", json!("b"), 5, b)).unwrap();

    let out = session.handle(a, set("k", json!("a"), 3, a)).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to, Recipient::Only(a));
    assert_eq!(
        out[0].message,
        ServerMessage::StorageSet { key: "k".into(), value: json!("b"), stamp: Stamp::new(5, b), origin: b }
    );
    assert_eq!(session.document().get("k"), Some(&json!("b")));
}

#[test]
fn stale_set_after_delete_answers_with_delete() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    session.handle(a, ClientMessage::StorageDelete { key: "k".into(), stamp: Stamp::new(9, a) }).unwrap();
    let out = session.handle(a, set("k", json!(1), 2, a)).unwrap();
    assert!(matches!(out[0].message, ServerMessage::StorageDelete { .. }));
    assert!(!session.document().contains("k"));
}

#[test]
fn accepted_delete_is_broadcast() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    session.handle(a, set("k", json!(1), 1, a)).unwrap();
    let out = session
        .handle(a, ClientMessage::StorageDelete { key: "k".into(), stamp: Stamp::new(2, a) })
        .unwrap();
    assert_eq!(out[0].to, Recipient::All);
    assert!(session.document().is_empty());
}

// =============================================================
// presence / chat
// =============================================================

#[test]
fn presence_goes_to_everyone_but_sender() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(Some(UserInfo::new("u", "Ada")));
    let presence = Presence { cursor: Some(Cursor { x: 1, y: 2 }), selection: None };
    let out = session.handle(a, ClientMessage::PresenceUpdate { presence: presence.clone() }).unwrap();
    assert_eq!(out[0].to, Recipient::AllExcept(a));
    let ServerMessage::PresenceUpdate { user, presence: sent, .. } = &out[0].message else {
        panic!("expected presence update");
    };
    assert_eq!(user.as_ref().map(|u| u.name.as_str()), Some("Ada"));
    assert_eq!(sent, &presence);
    assert!(session.document().is_empty());
}

#[test]
fn chat_is_appended_and_broadcast() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    let out = session.handle(a, ClientMessage::ChatAppend { text: "Lisbon?".into() }).unwrap();
    assert_eq!(out[0].to, Recipient::All);
    assert_eq!(session.chat().len(), 1);
    assert_eq!(session.chat().messages()[0].sender.name, "Anonymous");
}

#[test]
fn blank_chat_is_an_error() {
    let mut session = Session::new("s");
    let (a, _, _) = session.join(None);
    assert!(session.handle(a, ClientMessage::ChatAppend { text: " ".into() }).is_err());
    assert!(session.chat().is_empty());
}

#[test]
fn recipient_includes() {
    assert!(Recipient::All.includes(1));
    assert!(!Recipient::AllExcept(1).includes(1));
    assert!(Recipient::AllExcept(1).includes(2));
    assert!(Recipient::Only(3).includes(3));
    assert!(!Recipient::Only(3).includes(4));
}
