//! Engine: the interaction state machine wired to the scene and the replica.
//!
//! DESIGN
//! ======
//! `EngineCore` holds everything that does not need a browser: scene,
//! replica, tool state and the gesture in progress. Every input handler
//! returns a list of [`Action`]s for the host (repaint, cursor style, toolbar
//! update, open a text editor). Outgoing wire messages accumulate in the
//! replica's outbox; the host drains them with [`EngineCore::take_outbox`].
//!
//! Commit boundaries (shape finalized, path created, selection moved, sticky
//! placed, text edited, delete) write through the sync bridge inside one
//! history batch, so each gesture is one undo step. The writes themselves are
//! independent keys on the wire.
//!
//! Errors never escape a handler: a failed commit is logged and the scene is
//! re-derived from the document, so an object the relay never saw disappears.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use replica::client::Replica;
use replica::message::{ClientMessage, ServerMessage};
use replica::presence::UserInfo;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::camera::{Camera, Point};
use crate::consts::{
    CLICK_THRESHOLD_PX, CLONE_OFFSET, MIN_PATH_POINTS, MIN_SHAPE_SIZE, TEXT_FONT_SIZE, TEXT_PLACEHOLDER, ZOOM_STEP,
};
use crate::doc::{DrawableObject, ObjectId, Origin, Shape, storage_key};
use crate::error::CanvasError;
use crate::factory::{self, create_path, create_shape, create_sticky, create_text};
use crate::input::{Button, InteractionState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::presence;
use crate::render::DisplayList;
use crate::scene::{ImageStatus, SceneSurface};
use crate::sync;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    /// CSS cursor name for the canvas element.
    SetCursor(&'static str),
    /// The active tool changed without the toolbar asking (auto-reset).
    ToolChanged(Tool),
    /// Open an editor over a text object; answer with [`EngineCore::commit_text`].
    EditTextRequested { id: ObjectId, text: String },
    /// Storage keys written or deleted by one commit.
    Committed(Vec<String>),
}

/// Core engine state: all logic that doesn't depend on the canvas element.
pub struct EngineCore {
    pub scene: SceneSurface,
    pub replica: Replica,
    pub ui: UiState,
    pub input: InteractionState,
    clipboard: Vec<DrawableObject>,
    user: Option<UserInfo>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            scene: SceneSurface::new(),
            replica: Replica::default(),
            ui: UiState::default(),
            input: InteractionState::default(),
            clipboard: Vec::new(),
            user: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine for a signed-in user (sticky notes get an author label).
    #[must_use]
    pub fn with_user(user: Option<UserInfo>) -> Self {
        Self { user, ..Self::default() }
    }

    // =============================================================
    // Queries
    // =============================================================

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.scene.camera()
    }

    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&DrawableObject> {
        self.scene.get(id)
    }

    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        self.scene.active_ids()
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// Display list for the current frame, remote cursors included.
    #[must_use]
    pub fn render(&self) -> DisplayList {
        self.scene.render(&presence::cursor_glyphs(&self.replica))
    }

    // =============================================================
    // Transport
    // =============================================================

    /// Apply a relay message and re-materialize if the document moved.
    pub fn receive(&mut self, message: ServerMessage) -> Vec<Action> {
        let presence_only = message.is_presence();
        self.replica.receive(message);
        let mut actions = self.refresh();
        if presence_only && actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Messages for the relay, oldest first.
    pub fn take_outbox(&mut self) -> Vec<ClientMessage> {
        self.replica.take_outbox()
    }

    /// The transport dropped; the board goes inert until the next welcome.
    pub fn disconnect(&mut self) -> Vec<Action> {
        self.cancel_gesture();
        self.replica.disconnect();
        vec![Action::RenderNeeded]
    }

    /// Ids a materialization pass must not touch right now.
    fn protected_ids(&self) -> Vec<ObjectId> {
        match &self.input {
            InteractionState::MovingSelection { .. } => self.scene.expand_groups(self.scene.active_ids()),
            InteractionState::EditingText { id } => vec![*id],
            other => other.draft_id().into_iter().collect(),
        }
    }

    fn refresh(&mut self) -> Vec<Action> {
        if !self.replica.take_changed() {
            return Vec::new();
        }
        let protect = self.protected_ids();
        let report = sync::materialize(&mut self.scene, self.replica.document(), &protect);
        if report.changed() { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // =============================================================
    // Tool / color / viewport
    // =============================================================

    /// Switch tools. Any gesture in progress is discarded.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        self.cancel_gesture();
        self.ui.tool = tool;
        vec![Action::ToolChanged(tool), Action::SetCursor(cursor_for(tool))]
    }

    /// Switch tools by toolbar name; unknown names pick the rectangle.
    pub fn set_tool_by_name(&mut self, name: &str) -> Vec<Action> {
        self.set_tool(factory::parse_tool(name))
    }

    pub fn set_color(&mut self, color: &str) {
        color.clone_into(&mut self.ui.color);
    }

    /// Update viewport dimensions and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = dpr;
        vec![Action::RenderNeeded]
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0)
    }

    fn auto_reset_tool(&mut self, actions: &mut Vec<Action>) {
        if self.ui.tool != Tool::Select {
            self.ui.tool = Tool::Select;
            actions.push(Action::ToolChanged(Tool::Select));
            actions.push(Action::SetCursor(cursor_for(Tool::Select)));
        }
    }

    // =============================================================
    // Pointer input
    // =============================================================

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if !self.input.is_idle() {
            // A new press ends whatever was going on: editing, or a gesture
            // whose release we never saw.
            self.cancel_gesture();
        }
        let world = self.scene.camera().screen_to_world(screen);

        if button == Button::Middle || (button == Button::Primary && self.ui.space_held) {
            self.input = InteractionState::Panning { last_screen: screen };
            return vec![Action::SetCursor("grabbing")];
        }
        if button != Button::Primary {
            return Vec::new();
        }

        match self.ui.tool {
            Tool::Select => self.select_down(screen, world, modifiers),
            Tool::Eraser => self.erase_at(world),
            Tool::Freehand => {
                let mut path = create_path(vec![world], &self.ui.color);
                path.z_index = self.scene.next_z();
                let id = path.id;
                self.scene.add(path);
                self.input = InteractionState::DrawingFreehand { id, points: vec![world] };
                vec![Action::RenderNeeded]
            }
            tool if tool.is_drag_shape() => {
                let mut preview = create_shape(tool, world, &self.ui.color);
                size_from_drag(&mut preview.shape, world, world);
                preview.z_index = self.scene.next_z();
                let id = preview.id;
                self.scene.add(preview);
                self.input = InteractionState::DraggingShapePreview { id, anchor: world };
                vec![Action::RenderNeeded]
            }
            tool => {
                self.input = InteractionState::PendingPlacement { tool, down_screen: screen, down_world: world };
                Vec::new()
            }
        }
    }

    fn select_down(&mut self, screen: Point, world: Point, modifiers: Modifiers) -> Vec<Action> {
        let Some(target) = self.scene.find_target(world).map(|o| o.id) else {
            self.scene.clear_selection();
            presence::publish_selection(&mut self.replica, &[]);
            if modifiers.shift {
                return vec![Action::RenderNeeded];
            }
            self.input = InteractionState::Panning { last_screen: screen };
            return vec![Action::RenderNeeded, Action::SetCursor("grabbing")];
        };

        if modifiers.shift {
            self.scene.toggle_active(&target);
        } else if !self.scene.is_active(&target) {
            self.scene.set_active_object(&target);
        }
        self.scene.bring_to_front(&target);
        presence::publish_selection(&mut self.replica, self.scene.active_ids());
        self.input = InteractionState::MovingSelection { last_world: world, moved: false };
        vec![Action::RenderNeeded, Action::SetCursor("move")]
    }

    fn erase_at(&mut self, world: Point) -> Vec<Action> {
        let Some(target) = self.scene.find_target(world).map(|o| o.id) else {
            return Vec::new();
        };
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.delete_objects(&[target]));
        actions
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.scene.camera().screen_to_world(screen);
        presence::publish_cursor(&mut self.replica, Some(world), self.scene.active_ids());

        match &mut self.input {
            InteractionState::Panning { last_screen } => {
                let (dx, dy) = (screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                self.scene.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InteractionState::DrawingFreehand { id, points } => {
                points.push(world);
                if let Some(obj) = self.scene.get_mut(id) {
                    obj.shape = Shape::Path { points: points.clone() };
                }
                vec![Action::RenderNeeded]
            }
            InteractionState::DraggingShapePreview { id, anchor } => {
                if let Some(obj) = self.scene.get_mut(id) {
                    size_from_drag(&mut obj.shape, *anchor, world);
                }
                vec![Action::RenderNeeded]
            }
            InteractionState::MovingSelection { last_world, moved } => {
                let (dx, dy) = (world.x - last_world.x, world.y - last_world.y);
                *last_world = world;
                *moved = true;
                let active = self.scene.active_ids().to_vec();
                self.scene.translate_with_group(&active, dx, dy);
                vec![Action::RenderNeeded]
            }
            InteractionState::Idle | InteractionState::PendingPlacement { .. } | InteractionState::EditingText { .. } => {
                Vec::new()
            }
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.scene.camera().screen_to_world(screen);
        let state = std::mem::take(&mut self.input);
        debug!(state = state.name(), "engine: pointer up");

        match state {
            InteractionState::Idle => Vec::new(),
            InteractionState::EditingText { id } => {
                self.input = InteractionState::EditingText { id };
                Vec::new()
            }
            InteractionState::Panning { .. } => vec![Action::SetCursor(cursor_for(self.ui.tool))],
            InteractionState::DrawingFreehand { id, points } => self.finish_freehand(id, &points),
            InteractionState::DraggingShapePreview { id, anchor } => self.finish_drag_shape(id, anchor, world),
            InteractionState::PendingPlacement { tool, down_screen, down_world } => {
                self.finish_placement(tool, down_screen, down_world, screen, world)
            }
            InteractionState::MovingSelection { moved, .. } => {
                let ids = self.scene.expand_groups(self.scene.active_ids());
                let mut actions = vec![Action::SetCursor(cursor_for(self.ui.tool))];
                if moved {
                    actions.push(Action::RenderNeeded);
                }
                // Bring-to-front alone still changes z, so commit either way;
                // unchanged entries are skipped by the replica.
                actions.extend(self.commit(&ids));
                actions
            }
        }
    }

    /// The pointer left the canvas: finish the gesture as if released, and
    /// hide our cursor from peers.
    pub fn on_pointer_leave(&mut self, screen: Point) -> Vec<Action> {
        let actions = self.on_pointer_up(screen, Button::Primary, Modifiers::default());
        presence::publish_cursor(&mut self.replica, None, self.scene.active_ids());
        actions
    }

    /// Double-click opens the editor on a text object under the select tool.
    /// On a grouped shape such as a sticky background the lowest text sibling
    /// is edited instead.
    pub fn on_double_click(&mut self, screen: Point) -> Vec<Action> {
        if self.ui.tool != Tool::Select {
            return Vec::new();
        }
        let world = self.scene.camera().screen_to_world(screen);
        let Some(target) = self.scene.find_target(world).map(|o| o.id) else {
            return Vec::new();
        };
        let Some((id, text)) = self
            .scene
            .group_members(&target)
            .iter()
            .filter_map(|member| self.scene.get(member))
            .find_map(|o| o.text().map(|t| (o.id, t.to_string())))
        else {
            return Vec::new();
        };
        self.input = InteractionState::EditingText { id };
        self.scene.set_active_object(&id);
        vec![Action::EditTextRequested { id, text }, Action::RenderNeeded]
    }

    /// The host editor finished; store the new text.
    pub fn commit_text(&mut self, id: &ObjectId, text: &str) -> Vec<Action> {
        if matches!(self.input, InteractionState::EditingText { id: editing } if editing == *id) {
            self.input = InteractionState::Idle;
        }
        let changed = self.scene.get_mut(id).is_some_and(|o| o.set_text(text));
        if !changed {
            return Vec::new();
        }
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&[*id]));
        actions
    }

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            let factor = if delta.dy < 0.0 { 1.0 + ZOOM_STEP } else { 1.0 - ZOOM_STEP };
            self.scene.zoom_to_point(screen, factor);
        } else {
            self.scene.pan_by(-delta.dx, -delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    // =============================================================
    // Keyboard input
    // =============================================================

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if let InteractionState::EditingText { .. } = self.input {
            // The host editor owns the keyboard while editing.
            if key.is("Escape") {
                self.input = InteractionState::Idle;
                return vec![Action::RenderNeeded];
            }
            return Vec::new();
        }

        if modifiers.command() {
            return self.command_key(key, modifiers);
        }
        match key.0.as_str() {
            " " => {
                self.ui.space_held = true;
                vec![Action::SetCursor("grab")]
            }
            "Delete" | "Backspace" => {
                let ids = self.scene.active_ids().to_vec();
                self.delete_objects(&ids)
            }
            "Escape" => {
                self.cancel_gesture();
                self.scene.clear_selection();
                presence::publish_selection(&mut self.replica, &[]);
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    fn command_key(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        let center = self.viewport_center();
        match key.0.to_ascii_lowercase().as_str() {
            "z" if modifiers.shift => self.redo(),
            "z" => self.undo(),
            "y" => self.redo(),
            "c" => {
                self.copy_selection();
                Vec::new()
            }
            "v" => self.paste(),
            "+" | "=" => {
                self.scene.zoom_in(center);
                vec![Action::RenderNeeded]
            }
            "-" => {
                self.scene.zoom_out(center);
                vec![Action::RenderNeeded]
            }
            "0" => {
                self.scene.reset_view();
                vec![Action::RenderNeeded]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        if key.0 == " " {
            self.ui.space_held = false;
            return vec![Action::SetCursor(cursor_for(self.ui.tool))];
        }
        Vec::new()
    }

    // =============================================================
    // History
    // =============================================================

    pub fn undo(&mut self) -> Vec<Action> {
        match self.replica.undo() {
            Ok(true) => self.after_history(),
            Ok(false) => Vec::new(),
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "engine: undo failed");
                Vec::new()
            }
        }
    }

    pub fn redo(&mut self) -> Vec<Action> {
        match self.replica.redo() {
            Ok(true) => self.after_history(),
            Ok(false) => Vec::new(),
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "engine: redo failed");
                Vec::new()
            }
        }
    }

    fn after_history(&mut self) -> Vec<Action> {
        self.cancel_gesture();
        let mut actions = self.refresh();
        presence::publish_selection(&mut self.replica, self.scene.active_ids());
        if actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    // =============================================================
    // Clipboard
    // =============================================================

    fn copy_selection(&mut self) {
        let ids = self.scene.expand_groups(self.scene.active_ids());
        self.clipboard = ids.iter().filter_map(|id| self.scene.get(id)).cloned().collect();
        debug!(count = self.clipboard.len(), "engine: copied");
    }

    /// Clone the clipboard with fresh ids, offset, as new groups.
    fn paste(&mut self) -> Vec<Action> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        let mut groups: HashMap<Uuid, Uuid> = HashMap::new();
        let base_z = self.scene.next_z();
        let min_z = self.clipboard.iter().map(|o| o.z_index).min().unwrap_or(0);

        let clones: Vec<DrawableObject> = self
            .clipboard
            .iter()
            .map(|o| {
                let mut copy = o.cloned_with_new_id(CLONE_OFFSET, CLONE_OFFSET);
                copy.group_id = o.group_id.map(|g| *groups.entry(g).or_insert_with(Uuid::new_v4));
                copy.z_index = base_z + (o.z_index - min_z);
                copy
            })
            .collect();

        let ids: Vec<ObjectId> = clones.iter().map(|o| o.id).collect();
        self.clipboard.clone_from(&clones);
        for obj in clones {
            self.scene.add(obj);
        }
        self.scene.clear_selection();
        for id in &ids {
            self.scene.toggle_active(id);
        }

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&ids));
        actions
    }

    // =============================================================
    // Gesture completion
    // =============================================================

    fn finish_freehand(&mut self, id: ObjectId, points: &[Point]) -> Vec<Action> {
        if points.len() < MIN_PATH_POINTS {
            debug!(points = points.len(), "engine: path too short, discarded");
            self.scene.remove(&id);
            return vec![Action::RenderNeeded];
        }
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&[id]));
        actions
    }

    fn finish_drag_shape(&mut self, id: ObjectId, anchor: Point, world: Point) -> Vec<Action> {
        let Some(obj) = self.scene.get_mut(&id) else {
            return Vec::new();
        };
        size_from_drag(&mut obj.shape, anchor, world);
        let (w, h) = obj.size();
        if w <= MIN_SHAPE_SIZE || h <= MIN_SHAPE_SIZE {
            debug!(w, h, "engine: shape too small, discarded");
            self.scene.remove(&id);
            return vec![Action::RenderNeeded];
        }

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&[id]));
        self.scene.set_active_object(&id);
        self.auto_reset_tool(&mut actions);
        actions
    }

    fn finish_placement(
        &mut self,
        tool: Tool,
        down_screen: Point,
        down_world: Point,
        up_screen: Point,
        up_world: Point,
    ) -> Vec<Action> {
        let is_click = down_screen.distance(up_screen) < CLICK_THRESHOLD_PX;
        let objects = if is_click {
            self.placement_objects(tool, down_world)
        } else if tool == Tool::Text {
            // Drag sets the text box width.
            let width = (up_world.x - down_world.x).abs();
            if width <= MIN_SHAPE_SIZE {
                return Vec::new();
            }
            let corner = Point::new(down_world.x.min(up_world.x), down_world.y.min(up_world.y));
            vec![create_text(corner, TEXT_PLACEHOLDER, width, TEXT_FONT_SIZE, &self.ui.color)]
        } else {
            debug!(tool = tool.name(), "engine: placement dragged, cancelled");
            return Vec::new();
        };

        let mut z = self.scene.next_z();
        let mut ids = Vec::with_capacity(objects.len());
        for mut obj in objects {
            obj.z_index = z;
            z += 1;
            ids.push(obj.id);
            self.scene.add(obj);
        }

        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&ids));
        if let Some(first) = ids.first() {
            self.scene.set_active_object(first);
        }
        self.auto_reset_tool(&mut actions);
        actions
    }

    fn placement_objects(&self, tool: Tool, at: Point) -> Vec<DrawableObject> {
        match tool {
            Tool::Sticky => {
                let author = self.user.as_ref().map(|u| u.name.as_str());
                create_sticky(at, &self.ui.color, author).into_objects()
            }
            other => vec![create_shape(other, at, &self.ui.color)],
        }
    }

    /// Place an uploaded image at a world point and commit it.
    pub fn place_image(&mut self, url: &str, world: Point, width: f64, height: f64) -> Vec<Action> {
        let mut obj = factory::create_image(url, world, width, height);
        obj.z_index = self.scene.next_z();
        let id = obj.id;
        self.scene.add(obj);
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit(&[id]));
        self.scene.set_active_object(&id);
        self.auto_reset_tool(&mut actions);
        actions
    }

    /// Host finished decoding an image URL.
    pub fn image_loaded(&mut self, url: &str) -> Vec<Action> {
        self.scene.set_image_status(url, ImageStatus::Loaded);
        vec![Action::RenderNeeded]
    }

    /// Host could not decode an image URL. The object stays; a placeholder is drawn.
    pub fn image_failed(&mut self, url: &str) -> Vec<Action> {
        warn!(%url, "engine: image decode failed");
        self.scene.set_image_status(url, ImageStatus::Failed);
        vec![Action::RenderNeeded]
    }

    /// Drop the gesture in progress without committing it.
    fn cancel_gesture(&mut self) {
        let state = std::mem::take(&mut self.input);
        if let Some(draft) = state.draft_id() {
            self.scene.remove(&draft);
        }
        if let InteractionState::MovingSelection { moved: true, .. } = state {
            // Snap back to the stored positions.
            self.replica_resync();
        }
    }

    fn replica_resync(&mut self) {
        sync::materialize(&mut self.scene, self.replica.document(), &[]);
    }

    // =============================================================
    // Commit boundary
    // =============================================================

    /// Remove objects (cascading to group siblings) from scene and storage.
    fn delete_objects(&mut self, ids: &[ObjectId]) -> Vec<Action> {
        let targets = self.scene.expand_groups(ids);
        if targets.is_empty() {
            return Vec::new();
        }
        for id in &targets {
            self.scene.remove(id);
        }

        self.replica.begin_batch();
        let mut keys = Vec::with_capacity(targets.len());
        let mut result: Result<(), CanvasError> = Ok(());
        for id in &targets {
            match sync::delete_object_from_storage(&mut self.replica, id) {
                Ok(true) => keys.push(storage_key(id)),
                Ok(false) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.replica.end_batch();
        presence::publish_selection(&mut self.replica, self.scene.active_ids());

        let mut actions = vec![Action::RenderNeeded];
        match result {
            Ok(()) => {
                info!(count = keys.len(), "engine: deleted");
                actions.push(Action::Committed(keys));
            }
            Err(e) => self.commit_failed(&e),
        }
        actions
    }

    /// Write the given scene objects to storage as one undo step.
    fn commit(&mut self, ids: &[ObjectId]) -> Vec<Action> {
        self.replica.begin_batch();
        let mut keys = Vec::with_capacity(ids.len());
        let mut result: Result<(), CanvasError> = Ok(());
        for id in ids {
            let Some(obj) = self.scene.get_mut(id) else {
                continue;
            };
            match sync::sync_object_to_storage(&mut self.replica, obj) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.replica.end_batch();

        match result {
            Ok(()) => {
                debug!(count = keys.len(), "engine: committed");
                vec![Action::Committed(keys)]
            }
            Err(e) => {
                // Nothing here is a preview any more; let the resync drop what was not stored.
                for id in ids {
                    if let Some(obj) = self.scene.get_mut(id) {
                        obj.origin = Origin::Local;
                    }
                }
                self.commit_failed(&e);
                vec![Action::RenderNeeded]
            }
        }
    }

    fn commit_failed(&mut self, e: &CanvasError) {
        warn!(code = e.error_code(), error = %e, "engine: commit failed; reverting to stored state");
        self.replica_resync();
    }
}

/// Resize a drag-shape preview between `anchor` and `pointer`.
///
/// Rectangles and triangles span the two points; circles take half their
/// distance as radius, centered on the midpoint.
pub fn size_from_drag(shape: &mut Shape, anchor: Point, pointer: Point) {
    match shape {
        Shape::Rect { left, top, width, height } | Shape::Triangle { left, top, width, height } => {
            *left = anchor.x.min(pointer.x);
            *top = anchor.y.min(pointer.y);
            *width = (pointer.x - anchor.x).abs();
            *height = (pointer.y - anchor.y).abs();
        }
        Shape::Circle { left, top, radius } => {
            let center = anchor.midpoint(pointer);
            *radius = anchor.distance(pointer) / 2.0;
            *left = center.x - *radius;
            *top = center.y - *radius;
        }
        _ => {}
    }
}

fn cursor_for(tool: Tool) -> &'static str {
    match tool {
        Tool::Select => "default",
        Tool::Text => "text",
        Tool::Eraser => "not-allowed",
        _ => "crosshair",
    }
}

// =============================================================
// Browser wrapper
// =============================================================

#[cfg(feature = "web")]
pub use web::Engine;

#[cfg(feature = "web")]
mod web {
    use std::collections::HashMap;

    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    use super::{Action, EngineCore};
    use crate::paint;

    /// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
    pub struct Engine {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        images: HashMap<String, HtmlImageElement>,
        pub core: EngineCore,
    }

    impl Engine {
        /// Bind to a canvas element.
        ///
        /// # Errors
        ///
        /// Fails when the element has no 2D context.
        pub fn new(canvas: HtmlCanvasElement, core: EngineCore) -> Result<Self, JsValue> {
            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
                .dyn_into::<CanvasRenderingContext2d>()?;
            Ok(Self { canvas, ctx, images: HashMap::new(), core })
        }

        /// Resize the backing store to the CSS size times the pixel ratio.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
            self.canvas.set_width((width_css * dpr).round() as u32);
            self.canvas.set_height((height_css * dpr).round() as u32);
            self.core.set_viewport(width_css, height_css, dpr)
        }

        /// A decoded image is ready to draw.
        pub fn image_loaded(&mut self, url: &str, image: HtmlImageElement) -> Vec<Action> {
            self.images.insert(url.to_string(), image);
            self.core.image_loaded(url)
        }

        /// Image URLs the host should start loading.
        #[must_use]
        pub fn pending_images(&self) -> Vec<String> {
            self.core.scene.pending_images()
        }

        /// Draw the current state to the canvas.
        ///
        /// # Errors
        ///
        /// Propagates canvas API failures.
        pub fn render(&self) -> Result<(), JsValue> {
            let list = self.core.render();
            paint::paint(&self.ctx, &list, &self.images, self.core.dpr, self.core.viewport_width, self.core.viewport_height)
        }
    }
}
