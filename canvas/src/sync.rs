//! Synchronization bridge between the scene and the replicated document.
//!
//! DESIGN
//! ======
//! Outbound: every commit boundary calls [`sync_object_to_storage`] for each
//! touched object and [`delete_object_from_storage`] for each removed one.
//! The object id string is the storage key.
//!
//! Inbound: [`materialize`] makes the scene match the document. It is a diff,
//! not a rebuild: objects whose stored form is unchanged are left untouched,
//! so the echo of our own write (or the same snapshot applied twice) changes
//! nothing. Entries that fail to decode are skipped and logged; the rest of
//! the pass continues.
//!
//! Draft objects (gesture previews) and ids passed in `protect` (the
//! selection mid-drag) are never overwritten or removed by a pass.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::collections::HashSet;

use replica::client::Replica;
use replica::document::ReplicatedDocument;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::doc::{self, DrawableObject, ObjectId, Origin, storage_key};
use crate::error::CanvasError;
use crate::scene::SceneSurface;

/// Write one object under its id. Marks it as locally authored.
///
/// # Errors
///
/// Returns [`CanvasError::Replica`] when the replica is not connected.
pub fn sync_object_to_storage(replica: &mut Replica, obj: &mut DrawableObject) -> Result<String, CanvasError> {
    // Local even on failure, so the next pass drops an object that never got stored.
    obj.origin = Origin::Local;
    let key = storage_key(&obj.id);
    replica.set(&key, doc::serialize(obj)?)?;
    Ok(key)
}

/// Remove one object's entry. Returns `false` if it was not stored.
///
/// # Errors
///
/// Returns [`CanvasError::Replica`] when the replica is not connected.
pub fn delete_object_from_storage(replica: &mut Replica, id: &ObjectId) -> Result<bool, CanvasError> {
    Ok(replica.delete(&storage_key(id))?)
}

/// What one materialization pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Entries that failed to decode.
    pub skipped: usize,
}

impl MaterializeReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }
}

/// Same stored form, ignoring local bookkeeping.
fn same_content(a: &DrawableObject, b: &DrawableObject) -> bool {
    a.id == b.id && a.group_id == b.group_id && a.z_index == b.z_index && a.style == b.style && a.shape == b.shape
}

/// Bring `scene` in line with `document`.
pub fn materialize(scene: &mut SceneSurface, document: &ReplicatedDocument, protect: &[ObjectId]) -> MaterializeReport {
    let mut report = MaterializeReport::default();
    let protected: HashSet<&ObjectId> = protect.iter().collect();
    let mut present: HashSet<ObjectId> = HashSet::with_capacity(document.len());

    for (key, value, _stamp) in document.entries() {
        let incoming = match doc::materialize(value) {
            Ok(obj) if storage_key(&obj.id) == key => obj,
            Ok(obj) => {
                warn!(%key, object_id = %obj.id, "sync: key does not match objectId; skipping");
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(%key, code = e.error_code(), error = %e, "sync: skipping malformed object");
                report.skipped += 1;
                // Keep whatever we last had for this key.
                if let Ok(id) = Uuid::parse_str(key) {
                    present.insert(id);
                }
                continue;
            }
        };

        present.insert(incoming.id);
        if protected.contains(&incoming.id) {
            continue;
        }
        let keep = scene
            .get(&incoming.id)
            .map(|existing| existing.origin == Origin::Draft || same_content(existing, &incoming));
        match keep {
            Some(true) => {}
            Some(false) => {
                scene.add(incoming);
                report.updated += 1;
            }
            None => {
                scene.add(incoming);
                report.added += 1;
            }
        }
    }

    let stale: Vec<ObjectId> = scene
        .iter()
        .filter(|o| o.origin != Origin::Draft && !present.contains(&o.id) && !protected.contains(&o.id))
        .map(|o| o.id)
        .collect();
    for id in &stale {
        scene.remove(id);
    }
    report.removed = stale.len();

    scene.retain_selection();
    if report.changed() || report.skipped > 0 {
        debug!(
            added = report.added,
            updated = report.updated,
            removed = report.removed,
            skipped = report.skipped,
            "sync: materialized"
        );
    }
    report
}
