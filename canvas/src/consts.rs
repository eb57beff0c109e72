//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.2;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// Multiplicative zoom step per wheel notch or shortcut (±10%).
pub const ZOOM_STEP: f64 = 0.1;

// ── Gesture thresholds ──────────────────────────────────────────

/// Pointer travel, in screen pixels, below which a press is a click.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;

/// Drag-sized shapes at or below this size (world units) are discarded.
pub const MIN_SHAPE_SIZE: f64 = 5.0;

/// Freehand paths need at least this many points to be committed.
pub const MIN_PATH_POINTS: usize = 2;

/// Screen-space hit slop in pixels for thin strokes.
pub const HIT_SLOP_PX: f64 = 4.0;

// ── Shape defaults ──────────────────────────────────────────────

pub const DEFAULT_RECT_SIZE: f64 = 100.0;
pub const DEFAULT_CIRCLE_RADIUS: f64 = 50.0;
pub const DEFAULT_TRIANGLE_SIZE: f64 = 100.0;

pub const DEFAULT_STROKE: &str = "#1f2937";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const FREEHAND_STROKE_WIDTH: f64 = 4.0;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
pub const DEFAULT_TEXT_COLOR: &str = "#111827";

pub const TEXT_BOX_WIDTH: f64 = 200.0;
pub const TEXT_FONT_SIZE: f64 = 20.0;
pub const TEXT_PLACEHOLDER: &str = "Text";

/// Line height as a multiple of font size.
pub const LINE_HEIGHT: f64 = 1.2;

pub const STICKY_SIZE: f64 = 200.0;
pub const STICKY_INSET: f64 = 10.0;
pub const STICKY_FONT_SIZE: f64 = 16.0;
pub const STICKY_LABEL_FONT_SIZE: f64 = 11.0;

pub const STAMP_GLYPH: &str = "📍";
pub const STAMP_SIZE: f64 = 40.0;

/// Offset applied to pasted clones, in world units.
pub const CLONE_OFFSET: f64 = 20.0;

// ── Presence ────────────────────────────────────────────────────

/// Cursor colors, indexed by connection id modulo length.
pub const CURSOR_COLORS: [&str; 8] = [
    "#E57373", "#9575CD", "#4FC3F7", "#81C784", "#FFF176", "#FF8A65", "#F06292", "#7986CB",
];

// ── Selection UI ────────────────────────────────────────────────

pub const SELECTION_COLOR: &str = "#2563eb";
pub const SELECTION_PADDING_PX: f64 = 4.0;
