use serde_json::json;

use super::*;

fn stamp(clock: u64, connection: ConnectionId) -> Stamp {
    Stamp::new(clock, connection)
}

// =============================================================
// Stamp ordering
// =============================================================

#[test]
fn stamp_orders_by_clock_first() {
    assert!(stamp(2, 1) > stamp(1, 9));
}

#[test]
fn stamp_ties_broken_by_connection() {
    assert!(stamp(3, 2) > stamp(3, 1));
    assert_eq!(stamp(3, 2), stamp(3, 2));
}

// =============================================================
// set / get
// =============================================================

#[test]
fn new_document_is_empty() {
    let doc = ReplicatedDocument::new();
    assert!(doc.is_empty());
    assert_eq!(doc.max_clock(), 0);
}

#[test]
fn set_inserts_value() {
    let mut doc = ReplicatedDocument::new();
    assert!(doc.set("a", json!({"left": 1}), stamp(1, 1)));
    assert_eq!(doc.get("a"), Some(&json!({"left": 1})));
    assert_eq!(doc.len(), 1);
}

#[test]
fn later_write_replaces_whole_value() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!({"left": 1, "fill": "red"}), stamp(1, 1));
    doc.set("a", json!({"left": 5}), stamp(2, 2));
    assert_eq!(doc.get("a"), Some(&json!({"left": 5})));
}

#[test]
fn older_write_is_rejected() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(2), stamp(5, 1));
    assert!(!doc.set("a", json!(1), stamp(4, 9)));
    assert_eq!(doc.get("a"), Some(&json!(2)));
}

#[test]
fn equal_stamp_is_rejected() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(1), stamp(5, 1));
    assert!(!doc.set("a", json!(2), stamp(5, 1)));
    assert_eq!(doc.get("a"), Some(&json!(1)));
}

#[test]
fn delivery_order_does_not_change_outcome() {
    let writes = [(json!("x"), stamp(1, 1)), (json!("y"), stamp(2, 2)), (json!("z"), stamp(2, 1))];

    let mut forward = ReplicatedDocument::new();
    for (value, s) in &writes {
        forward.set("k", value.clone(), *s);
    }
    let mut backward = ReplicatedDocument::new();
    for (value, s) in writes.iter().rev() {
        backward.set("k", value.clone(), *s);
    }

    assert_eq!(forward.get("k"), Some(&json!("y")));
    assert_eq!(forward.get("k"), backward.get("k"));
}

// =============================================================
// delete / tombstones
// =============================================================

#[test]
fn delete_removes_value() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(1), stamp(1, 1));
    assert!(doc.delete("a", stamp(2, 1)));
    assert!(doc.get("a").is_none());
    assert!(doc.is_empty());
}

#[test]
fn tombstone_blocks_older_set() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(1), stamp(1, 1));
    doc.delete("a", stamp(3, 1));
    assert!(!doc.set("a", json!(2), stamp(2, 2)));
    assert!(!doc.contains("a"));
}

#[test]
fn newer_set_after_delete_recreates() {
    let mut doc = ReplicatedDocument::new();
    doc.delete("a", stamp(3, 1));
    assert!(doc.set("a", json!(9), stamp(4, 1)));
    assert_eq!(doc.get("a"), Some(&json!(9)));
}

#[test]
fn tombstone_keeps_stamp() {
    let mut doc = ReplicatedDocument::new();
    doc.delete("gone", stamp(7, 2));
    assert_eq!(doc.stamp("gone"), Some(stamp(7, 2)));
    assert_eq!(doc.max_clock(), 7);
}

// =============================================================
// Snapshots
// =============================================================

#[test]
fn snapshot_excludes_tombstones() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(1), stamp(1, 1));
    doc.set("b", json!(2), stamp(2, 1));
    doc.delete("a", stamp(3, 1));
    let snap = doc.snapshot();
    assert_eq!(snap.canvas_objects.len(), 1);
    assert!(snap.canvas_objects.contains_key("b"));
}

#[test]
fn snapshot_serializes_with_canvas_objects_key() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!({"type": "rectangle"}), stamp(1, 1));
    let value = serde_json::to_value(doc.snapshot()).unwrap();
    assert_eq!(value, json!({"canvasObjects": {"a": {"type": "rectangle"}}}));
}

#[test]
fn from_snapshot_restores_values_and_stamps() {
    let mut doc = ReplicatedDocument::new();
    doc.set("a", json!(1), stamp(4, 2));
    doc.set("b", json!(2), stamp(6, 1));

    let mut restored = ReplicatedDocument::from_snapshot(doc.snapshot(), &doc.stamps());
    assert_eq!(restored.get("a"), Some(&json!(1)));
    assert_eq!(restored.stamp("b"), Some(stamp(6, 1)));
    assert!(!restored.set("a", json!(0), stamp(3, 9)));
}

#[test]
fn keys_are_sorted() {
    let mut doc = ReplicatedDocument::new();
    doc.set("c", json!(1), stamp(1, 1));
    doc.set("a", json!(1), stamp(2, 1));
    doc.set("b", json!(1), stamp(3, 1));
    assert_eq!(doc.keys(), vec!["a", "b", "c"]);
}
