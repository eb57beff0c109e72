//! Document model: drawable objects, their geometry, and the wire form.
//!
//! `DrawableObject` is the typed in-memory entity the scene holds. Geometry
//! lives in the [`Shape`] tagged union, one variant per kind; identity
//! (`id`, `group_id`), stacking order and style are common fields. The
//! replicated document stores [`SerializedShape`] records as JSON, keyed by
//! the object id string.
//!
//! [`serialize`] and [`materialize`] are exact inverses for every field that
//! travels; [`Origin`] is local bookkeeping and never leaves the client.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{DEFAULT_FONT_FAMILY, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, LINE_HEIGHT};
use crate::error::CanvasError;

/// Unique identifier for a drawable object.
pub type ObjectId = Uuid;

/// Shared identifier of the siblings in a sticky-note composite.
pub type GroupId = Uuid;

/// Storage key for an object id.
#[must_use]
pub fn storage_key(id: &ObjectId) -> String {
    id.to_string()
}

/// The kind of a drawable object, as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Rectangle,
    Circle,
    Triangle,
    Text,
    /// Background card of a sticky note.
    StickyBackground,
    FreehandPath,
    Stamp,
    Image,
}

impl ObjectKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Text => "text",
            Self::StickyBackground => "sticky-background",
            Self::FreehandPath => "freehand-path",
            Self::Stamp => "stamp",
            Self::Image => "image",
        }
    }
}

/// Where the local copy of an object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Being built by a gesture on this client; not in storage yet.
    #[default]
    Draft,
    /// Authored here and committed to storage.
    Local,
    /// Materialized from the replicated document.
    Remote,
}

/// Paint attributes shared by every kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub font_family: String,
}

impl Style {
    /// Filled shape with the default outline.
    #[must_use]
    pub fn filled(fill: &str) -> Self {
        Self {
            fill: fill.to_string(),
            stroke: DEFAULT_STROKE.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    /// Unfilled stroke, as used by freehand paths.
    #[must_use]
    pub fn stroked(stroke: &str, width: f64) -> Self {
        Self {
            fill: "transparent".to_string(),
            stroke: stroke.to_string(),
            stroke_width: width,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

/// Geometry per kind. Positions are world coordinates; `left`/`top` is the
/// top-left of the bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { left: f64, top: f64, width: f64, height: f64 },
    Circle { left: f64, top: f64, radius: f64 },
    /// Isosceles triangle: apex at top-center, base along the bottom edge.
    Triangle { left: f64, top: f64, width: f64, height: f64 },
    Text { left: f64, top: f64, width: f64, text: String, font_size: f64 },
    StickyBackground { left: f64, top: f64, width: f64, height: f64 },
    Path { points: Vec<Point> },
    Stamp { left: f64, top: f64, glyph: String, size: f64 },
    Image { left: f64, top: f64, width: f64, height: f64, url: String },
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.left + self.width && p.y >= self.top && p.y <= self.top + self.height
    }

    #[must_use]
    pub fn inflate(&self, by: f64) -> Self {
        Self { left: self.left - by, top: self.top - by, width: self.width + 2.0 * by, height: self.height + 2.0 * by }
    }
}

/// Bounding box of a point sequence; empty input yields a zero box at the origin.
#[must_use]
pub fn path_bounds(points: &[Point]) -> Bounds {
    let Some(first) = points.first() else {
        return Bounds { left: 0.0, top: 0.0, width: 0.0, height: 0.0 };
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Bounds { left: min_x, top: min_y, width: max_x - min_x, height: max_y - min_y }
}

/// Rendered height of a text block.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn text_height(text: &str, font_size: f64) -> f64 {
    let lines = text.lines().count().max(1);
    lines as f64 * font_size * LINE_HEIGHT
}

/// The atomic unit of the whiteboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableObject {
    /// Assigned at creation, never changes.
    pub id: ObjectId,
    /// Set on every sibling of a sticky-note composite.
    pub group_id: Option<GroupId>,
    pub origin: Origin,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    pub style: Style,
    pub shape: Shape,
}

impl DrawableObject {
    /// New draft object with a fresh id.
    #[must_use]
    pub fn new(shape: Shape, style: Style) -> Self {
        Self { id: Uuid::new_v4(), group_id: None, origin: Origin::Draft, z_index: 0, style, shape }
    }

    #[must_use]
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self.shape {
            Shape::Rect { .. } => ObjectKind::Rectangle,
            Shape::Circle { .. } => ObjectKind::Circle,
            Shape::Triangle { .. } => ObjectKind::Triangle,
            Shape::Text { .. } => ObjectKind::Text,
            Shape::StickyBackground { .. } => ObjectKind::StickyBackground,
            Shape::Path { .. } => ObjectKind::FreehandPath,
            Shape::Stamp { .. } => ObjectKind::Stamp,
            Shape::Image { .. } => ObjectKind::Image,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        match &self.shape {
            Shape::Rect { left, top, width, height }
            | Shape::Triangle { left, top, width, height }
            | Shape::StickyBackground { left, top, width, height }
            | Shape::Image { left, top, width, height, .. } => {
                Bounds { left: *left, top: *top, width: *width, height: *height }
            }
            Shape::Circle { left, top, radius } => {
                Bounds { left: *left, top: *top, width: radius * 2.0, height: radius * 2.0 }
            }
            Shape::Text { left, top, width, text, font_size } => {
                Bounds { left: *left, top: *top, width: *width, height: text_height(text, *font_size) }
            }
            Shape::Stamp { left, top, size, .. } => Bounds { left: *left, top: *top, width: *size, height: *size },
            Shape::Path { points } => path_bounds(points),
        }
    }

    /// Width and height of the bounding box.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        let b = self.bounds();
        (b.width, b.height)
    }

    /// Top-left corner of the bounding box.
    #[must_use]
    pub fn position(&self) -> Point {
        let b = self.bounds();
        Point::new(b.left, b.top)
    }

    /// Move by a world-space delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::Rect { left, top, .. }
            | Shape::Circle { left, top, .. }
            | Shape::Triangle { left, top, .. }
            | Shape::Text { left, top, .. }
            | Shape::StickyBackground { left, top, .. }
            | Shape::Stamp { left, top, .. }
            | Shape::Image { left, top, .. } => {
                *left += dx;
                *top += dy;
            }
            Shape::Path { points } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Text content for text-bearing kinds.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Replace the text of a text object. Returns `false` for other kinds.
    pub fn set_text(&mut self, value: &str) -> bool {
        match &mut self.shape {
            Shape::Text { text, .. } => {
                value.clone_into(text);
                true
            }
            _ => false,
        }
    }

    /// Copy with a fresh id, offset by `(dx, dy)`, as a draft.
    #[must_use]
    pub fn cloned_with_new_id(&self, dx: f64, dy: f64) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        copy.origin = Origin::Draft;
        copy.translate(dx, dy);
        copy
    }
}

// =============================================================
// Wire form
// =============================================================

/// Flat record stored in the replicated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedShape {
    pub object_id: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub left: f64,
    pub top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub z_index: i64,
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

impl SerializedShape {
    fn base(obj: &DrawableObject, left: f64, top: f64) -> Self {
        Self {
            object_id: storage_key(&obj.id),
            kind: obj.kind(),
            group_id: obj.group_id.as_ref().map(Uuid::to_string),
            left,
            top,
            width: None,
            height: None,
            radius: None,
            points: None,
            text: None,
            font_size: None,
            glyph: None,
            src: None,
            fill: obj.style.fill.clone(),
            stroke: obj.style.stroke.clone(),
            stroke_width: obj.style.stroke_width,
            font_family: obj.style.font_family.clone(),
            z_index: obj.z_index,
        }
    }
}

impl From<&DrawableObject> for SerializedShape {
    fn from(obj: &DrawableObject) -> Self {
        match &obj.shape {
            Shape::Rect { left, top, width, height }
            | Shape::Triangle { left, top, width, height }
            | Shape::StickyBackground { left, top, width, height } => Self {
                width: Some(*width),
                height: Some(*height),
                ..Self::base(obj, *left, *top)
            },
            Shape::Circle { left, top, radius } => Self { radius: Some(*radius), ..Self::base(obj, *left, *top) },
            Shape::Text { left, top, width, text, font_size } => Self {
                width: Some(*width),
                text: Some(text.clone()),
                font_size: Some(*font_size),
                ..Self::base(obj, *left, *top)
            },
            Shape::Path { points } => {
                let b = path_bounds(points);
                Self {
                    points: Some(points.iter().map(|p| [p.x, p.y]).collect()),
                    ..Self::base(obj, b.left, b.top)
                }
            }
            Shape::Stamp { left, top, glyph, size } => Self {
                glyph: Some(glyph.clone()),
                width: Some(*size),
                ..Self::base(obj, *left, *top)
            },
            Shape::Image { left, top, width, height, url } => Self {
                width: Some(*width),
                height: Some(*height),
                src: Some(url.clone()),
                ..Self::base(obj, *left, *top)
            },
        }
    }
}

fn required<T>(value: Option<T>, kind: ObjectKind, field: &'static str) -> Result<T, CanvasError> {
    value.ok_or(CanvasError::MissingField { kind: kind.as_str(), field })
}

fn parse_id(raw: &str) -> Result<Uuid, CanvasError> {
    Uuid::parse_str(raw).map_err(|_| CanvasError::InvalidId(raw.to_string()))
}

impl TryFrom<SerializedShape> for DrawableObject {
    type Error = CanvasError;

    fn try_from(s: SerializedShape) -> Result<Self, Self::Error> {
        let kind = s.kind;
        let (left, top) = (s.left, s.top);
        let shape = match kind {
            ObjectKind::Rectangle => Shape::Rect {
                left,
                top,
                width: required(s.width, kind, "width")?,
                height: required(s.height, kind, "height")?,
            },
            ObjectKind::Triangle => Shape::Triangle {
                left,
                top,
                width: required(s.width, kind, "width")?,
                height: required(s.height, kind, "height")?,
            },
            ObjectKind::StickyBackground => Shape::StickyBackground {
                left,
                top,
                width: required(s.width, kind, "width")?,
                height: required(s.height, kind, "height")?,
            },
            ObjectKind::Circle => Shape::Circle { left, top, radius: required(s.radius, kind, "radius")? },
            ObjectKind::Text => Shape::Text {
                left,
                top,
                width: required(s.width, kind, "width")?,
                text: s.text.unwrap_or_default(),
                font_size: required(s.font_size, kind, "fontSize")?,
            },
            ObjectKind::FreehandPath => Shape::Path {
                points: required(s.points, kind, "points")?
                    .into_iter()
                    .map(|[x, y]| Point::new(x, y))
                    .collect(),
            },
            ObjectKind::Stamp => Shape::Stamp {
                left,
                top,
                glyph: required(s.glyph, kind, "glyph")?,
                size: required(s.width, kind, "width")?,
            },
            ObjectKind::Image => Shape::Image {
                left,
                top,
                width: required(s.width, kind, "width")?,
                height: required(s.height, kind, "height")?,
                url: required(s.src, kind, "src")?,
            },
        };

        Ok(Self {
            id: parse_id(&s.object_id)?,
            group_id: s.group_id.as_deref().map(parse_id).transpose()?,
            origin: Origin::Remote,
            z_index: s.z_index,
            style: Style { fill: s.fill, stroke: s.stroke, stroke_width: s.stroke_width, font_family: s.font_family },
            shape,
        })
    }
}

/// Serialize an object into its stored JSON value.
///
/// # Errors
///
/// Returns [`CanvasError::Malformed`] if JSON encoding fails (non-finite numbers).
pub fn serialize(obj: &DrawableObject) -> Result<Value, CanvasError> {
    Ok(serde_json::to_value(SerializedShape::from(obj))?)
}

/// Rebuild an object from its stored JSON value, tagged [`Origin::Remote`].
///
/// # Errors
///
/// Returns [`CanvasError`] when the value is not a valid serialized shape.
pub fn materialize(value: &Value) -> Result<DrawableObject, CanvasError> {
    let record = SerializedShape::deserialize(value)?;
    DrawableObject::try_from(record)
}
