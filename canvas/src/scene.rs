//! Scene surface: the local view's object set, selection and viewport.
//!
//! DESIGN
//! ======
//! Objects live in a map keyed by id; stacking order is the `z_index` field,
//! ties broken by id so every client stacks identically. The selection is an
//! ordered id list and never holds ids that are not in the map.
//!
//! Sticky-note siblings share a group id. Group rules (move together, delete
//! together) are applied here through [`SceneSurface::expand_groups`] so the
//! engine only ever asks for "the selection" and gets whole composites back.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::{HashMap, HashSet};

use crate::camera::{Camera, Point};
use crate::consts::HIT_SLOP_PX;
use crate::doc::{DrawableObject, ObjectId, Shape};
use crate::hit;
use crate::presence::CursorGlyph;
use crate::render::{self, DisplayList};

/// Decode state of an image URL, reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageStatus {
    #[default]
    Pending,
    Loaded,
    /// Drawn as a placeholder; the object stays in the document.
    Failed,
}

#[derive(Debug, Default)]
pub struct SceneSurface {
    objects: HashMap<ObjectId, DrawableObject>,
    active: Vec<ObjectId>,
    camera: Camera,
    images: HashMap<String, ImageStatus>,
}

impl SceneSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =============================================================
    // Objects
    // =============================================================

    /// Insert or replace an object. Returns the previous copy, if any.
    pub fn add(&mut self, obj: DrawableObject) -> Option<DrawableObject> {
        self.objects.insert(obj.id, obj)
    }

    /// Remove one object (no group cascade) and drop it from the selection.
    pub fn remove(&mut self, id: &ObjectId) -> Option<DrawableObject> {
        self.active.retain(|a| a != id);
        self.objects.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&DrawableObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut DrawableObject> {
        self.objects.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawableObject> {
        self.objects.values()
    }

    /// Objects bottom to top.
    #[must_use]
    pub fn ordered(&self) -> Vec<&DrawableObject> {
        let mut out: Vec<&DrawableObject> = self.objects.values().collect();
        out.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Topmost object under `world`, or `None` over empty canvas.
    #[must_use]
    pub fn find_target(&self, world: Point) -> Option<&DrawableObject> {
        let slop = self.camera.screen_dist_to_world(HIT_SLOP_PX);
        self.ordered().into_iter().rev().find(|obj| hit::contains(obj, world, slop))
    }

    /// One above the current top of the stack.
    #[must_use]
    pub fn next_z(&self) -> i64 {
        self.objects.values().map(|o| o.z_index).max().map_or(0, |z| z + 1)
    }

    /// Raise `id` and its group siblings above everything else, keeping their
    /// relative order. Returns the ids whose z changed.
    pub fn bring_to_front(&mut self, id: &ObjectId) -> Vec<ObjectId> {
        let members = self.group_members(id);
        let member_set: HashSet<&ObjectId> = members.iter().collect();
        let others_top = self
            .objects
            .values()
            .filter(|o| !member_set.contains(&o.id))
            .map(|o| o.z_index)
            .max();
        let members_bottom = members.iter().filter_map(|m| self.objects.get(m)).map(|o| o.z_index).min();

        let (Some(others_top), Some(bottom)) = (others_top, members_bottom) else {
            return Vec::new();
        };
        if bottom > others_top {
            return Vec::new();
        }

        let shift = others_top + 1 - bottom;
        let mut changed = Vec::with_capacity(members.len());
        for m in members {
            if let Some(obj) = self.objects.get_mut(&m) {
                obj.z_index += shift;
                changed.push(m);
            }
        }
        changed
    }

    // =============================================================
    // Groups
    // =============================================================

    /// `id` plus every object sharing its group id, bottom to top.
    #[must_use]
    pub fn group_members(&self, id: &ObjectId) -> Vec<ObjectId> {
        let Some(obj) = self.objects.get(id) else {
            return Vec::new();
        };
        let Some(group) = obj.group_id else {
            return vec![*id];
        };
        let mut members: Vec<&DrawableObject> =
            self.objects.values().filter(|o| o.group_id == Some(group)).collect();
        members.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        members.into_iter().map(|o| o.id).collect()
    }

    /// Expand ids to whole groups, without duplicates, first-seen order.
    #[must_use]
    pub fn expand_groups(&self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in ids {
            for member in self.group_members(id) {
                if seen.insert(member) {
                    out.push(member);
                }
            }
        }
        out
    }

    /// Remove `id` and all its group siblings. Returns what was removed.
    pub fn remove_with_group(&mut self, id: &ObjectId) -> Vec<DrawableObject> {
        self.group_members(id).iter().filter_map(|m| self.remove(m)).collect()
    }

    /// Move objects (expanded to their groups) by a world delta. Returns the moved ids.
    pub fn translate_with_group(&mut self, ids: &[ObjectId], dx: f64, dy: f64) -> Vec<ObjectId> {
        let expanded = self.expand_groups(ids);
        for id in &expanded {
            if let Some(obj) = self.objects.get_mut(id) {
                obj.translate(dx, dy);
            }
        }
        expanded
    }

    // =============================================================
    // Selection
    // =============================================================

    /// Make `id` the only selected object. Unknown ids leave the selection alone.
    pub fn set_active_object(&mut self, id: &ObjectId) -> bool {
        if !self.objects.contains_key(id) {
            return false;
        }
        self.active = vec![*id];
        true
    }

    /// Add or remove `id` from the selection.
    pub fn toggle_active(&mut self, id: &ObjectId) {
        if let Some(pos) = self.active.iter().position(|a| a == id) {
            self.active.remove(pos);
        } else if self.objects.contains_key(id) {
            self.active.push(*id);
        }
    }

    #[must_use]
    pub fn get_active_objects(&self) -> Vec<&DrawableObject> {
        self.active.iter().filter_map(|id| self.objects.get(id)).collect()
    }

    #[must_use]
    pub fn active_ids(&self) -> &[ObjectId] {
        &self.active
    }

    #[must_use]
    pub fn is_active(&self, id: &ObjectId) -> bool {
        self.active.contains(id)
    }

    pub fn clear_selection(&mut self) {
        self.active.clear();
    }

    /// Drop selected ids that no longer exist.
    pub fn retain_selection(&mut self) {
        let objects = &self.objects;
        self.active.retain(|id| objects.contains_key(id));
    }

    // =============================================================
    // Viewport
    // =============================================================

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn zoom_to_point(&mut self, screen: Point, factor: f64) {
        self.camera.zoom_to_point(screen, factor);
    }

    pub fn zoom_in(&mut self, screen: Point) {
        self.camera.zoom_in(screen);
    }

    pub fn zoom_out(&mut self, screen: Point) {
        self.camera.zoom_out(screen);
    }

    pub fn pan_to(&mut self, pan_x: f64, pan_y: f64) {
        self.camera.pan_to(pan_x, pan_y);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.pan_by(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
    }

    // =============================================================
    // Images
    // =============================================================

    #[must_use]
    pub fn image_status(&self, url: &str) -> ImageStatus {
        self.images.get(url).copied().unwrap_or_default()
    }

    pub fn set_image_status(&mut self, url: &str, status: ImageStatus) {
        self.images.insert(url.to_string(), status);
    }

    /// Image URLs on the board the host has not reported on yet.
    #[must_use]
    pub fn pending_images(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .objects
            .values()
            .filter_map(|o| match &o.shape {
                Shape::Image { url, .. } if !self.images.contains_key(url) => Some(url.clone()),
                _ => None,
            })
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }

    // =============================================================
    // Render
    // =============================================================

    /// Display list for the current objects, selection, viewport and cursors.
    #[must_use]
    pub fn render(&self, cursors: &[CursorGlyph]) -> DisplayList {
        render::build(self, cursors)
    }
}
