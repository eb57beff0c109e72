//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InteractionState` is the gesture tracked between pointer-down and
//! pointer-up, carrying what the engine needs to update a preview on move and
//! to commit or discard on release. None of this is replicated.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::ObjectId;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    Rectangle,
    Circle,
    Triangle,
    /// Click to place, or drag to size, an editable text box.
    Text,
    /// Click to place a sticky-note composite.
    Sticky,
    Freehand,
    /// Click to place the pin glyph.
    Stamp,
    /// Delete whatever is clicked.
    Eraser,
}

impl Tool {
    /// Every tool, in toolbar order.
    pub const ALL: [Tool; 9] = [
        Self::Select,
        Self::Rectangle,
        Self::Circle,
        Self::Triangle,
        Self::Text,
        Self::Sticky,
        Self::Freehand,
        Self::Stamp,
        Self::Eraser,
    ];

    /// Identifier used by the host toolbar.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Text => "text",
            Self::Sticky => "sticky",
            Self::Freehand => "freehand",
            Self::Stamp => "stamp",
            Self::Eraser => "eraser",
        }
    }

    /// Look up a tool by identifier. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Drag-to-size shapes with a live preview.
    #[must_use]
    pub fn is_drag_shape(self) -> bool {
        matches!(self, Self::Rectangle | Self::Circle | Self::Triangle)
    }

    /// Tools that place one object where the pointer is released.
    #[must_use]
    pub fn is_placement(self) -> bool {
        matches!(self, Self::Text | Self::Sticky | Self::Stamp)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Per-client UI state that outlives a single gesture.
#[derive(Debug, Clone)]
pub struct UiState {
    pub tool: Tool,
    /// Fill (or stroke, for freehand) applied to new objects.
    pub color: String,
    /// Space is held; a primary drag pans.
    pub space_held: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: Tool::Select, color: "#60a5fa".to_string(), space_held: false }
    }
}

/// The gesture in progress.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Freehand stroke; every move appends a world-space point.
    DrawingFreehand { id: ObjectId, points: Vec<Point> },
    /// Drag-sized shape with a live preview in the scene.
    DraggingShapePreview {
        id: ObjectId,
        /// World-space point where the drag started.
        anchor: Point,
    },
    /// Placement tool pressed; click versus drag is decided on release.
    PendingPlacement { tool: Tool, down_screen: Point, down_world: Point },
    /// Moving the selection (and grouped siblings) with the select tool.
    MovingSelection {
        /// World-space pointer position at the previous event.
        last_world: Point,
        /// At least one move event shifted the selection.
        moved: bool,
    },
    /// The host is editing a text object's content.
    EditingText { id: ObjectId },
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
}

impl InteractionState {
    /// Short state name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrawingFreehand { .. } => "drawing-freehand",
            Self::DraggingShapePreview { .. } => "dragging-shape-preview",
            Self::PendingPlacement { .. } => "pending-placement",
            Self::MovingSelection { .. } => "moving-selection",
            Self::EditingText { .. } => "editing-text",
            Self::Panning { .. } => "panning",
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Draft object owned by the gesture, which materialization must leave alone.
    #[must_use]
    pub fn draft_id(&self) -> Option<ObjectId> {
        match self {
            Self::DrawingFreehand { id, .. } | Self::DraggingShapePreview { id, .. } => Some(*id),
            _ => None,
        }
    }
}
