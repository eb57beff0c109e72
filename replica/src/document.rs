//! Replicated document: a last-writer-wins map from object id to serialized shape.
//!
//! Every key carries the [`Stamp`] of the write that produced its current
//! state. A write only lands when its stamp is strictly greater than the
//! recorded one, so any two replicas that observe the same set of writes end
//! up with the same value per key regardless of delivery order. Deletes keep a
//! tombstone stamp so an older `set` arriving late cannot resurrect the key.
//!
//! Values are opaque JSON. Concurrent edits to one object are never merged
//! field by field; the later write replaces the whole value.

#[cfg(test)]
#[path = "document_test.rs"]
mod document_test;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ConnectionId;

/// Logical timestamp of a write: a Lamport clock tie-broken by connection id.
///
/// Ordering is `(clock, connection)`, which gives a total order across the
/// session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub clock: u64,
    pub connection: ConnectionId,
}

impl Stamp {
    #[must_use]
    pub fn new(clock: u64, connection: ConnectionId) -> Self {
        Self { clock, connection }
    }
}

/// Storage snapshot as exchanged with late joiners: `{"canvasObjects": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    #[serde(rename = "canvasObjects")]
    pub canvas_objects: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
struct Slot {
    /// `None` marks a tombstone.
    value: Option<Value>,
    stamp: Stamp,
}

/// The shared map of board contents for one session.
#[derive(Debug, Clone, Default)]
pub struct ReplicatedDocument {
    slots: HashMap<String, Slot>,
}

impl ReplicatedDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a document from a snapshot and the stamps of its live keys.
    ///
    /// Keys without a recorded stamp get the zero stamp, so any later write wins.
    #[must_use]
    pub fn from_snapshot(snapshot: StorageSnapshot, stamps: &BTreeMap<String, Stamp>) -> Self {
        let slots = snapshot
            .canvas_objects
            .into_iter()
            .map(|(key, value)| {
                let stamp = stamps.get(&key).copied().unwrap_or_default();
                (key, Slot { value: Some(value), stamp })
            })
            .collect();
        Self { slots }
    }

    /// Live value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.slots.get(key).and_then(|slot| slot.value.as_ref())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stamp of the last accepted write to `key`, tombstones included.
    #[must_use]
    pub fn stamp(&self, key: &str) -> Option<Stamp> {
        self.slots.get(key).map(|slot| slot.stamp)
    }

    /// Write `value` under `key` if `stamp` beats the recorded one.
    ///
    /// Returns `true` when the write was applied.
    pub fn set(&mut self, key: impl Into<String>, value: Value, stamp: Stamp) -> bool {
        self.write(key.into(), Some(value), stamp)
    }

    /// Remove `key` if `stamp` beats the recorded one. A tombstone is kept.
    ///
    /// Returns `true` when the delete was applied (even if the key was absent).
    pub fn delete(&mut self, key: impl Into<String>, stamp: Stamp) -> bool {
        self.write(key.into(), None, stamp)
    }

    fn write(&mut self, key: String, value: Option<Value>, stamp: Stamp) -> bool {
        match self.slots.get_mut(&key) {
            Some(slot) if slot.stamp >= stamp => false,
            Some(slot) => {
                slot.value = value;
                slot.stamp = stamp;
                true
            }
            None => {
                self.slots.insert(key, Slot { value, stamp });
                true
            }
        }
    }

    /// Highest clock value recorded on any key.
    #[must_use]
    pub fn max_clock(&self) -> u64 {
        self.slots.values().map(|slot| slot.stamp.clock).max().unwrap_or(0)
    }

    /// Live entries as `(key, value, stamp)`, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value, Stamp)> {
        self.slots
            .iter()
            .filter_map(|(key, slot)| slot.value.as_ref().map(|value| (key.as_str(), value, slot.stamp)))
    }

    /// Live keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries().map(|(key, _, _)| key).collect();
        keys.sort_unstable();
        keys
    }

    /// Copy of the live contents.
    #[must_use]
    pub fn snapshot(&self) -> StorageSnapshot {
        StorageSnapshot {
            canvas_objects: self
                .entries()
                .map(|(key, value, _)| (key.to_string(), value.clone()))
                .collect(),
        }
    }

    /// Stamps of the live keys, for shipping alongside [`Self::snapshot`].
    #[must_use]
    pub fn stamps(&self) -> BTreeMap<String, Stamp> {
        self.entries()
            .map(|(key, _, stamp)| (key.to_string(), stamp))
            .collect()
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
