//! Shape factory: builds typed drawable objects from a tool, a pointer and a color.
//!
//! Every constructor returns a fresh [`Origin::Draft`](crate::doc::Origin)
//! object with a new id. Nothing is added to the scene or the document here;
//! the engine does that at the commit boundary.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use tracing::debug;
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{
    DEFAULT_CIRCLE_RADIUS, DEFAULT_RECT_SIZE, DEFAULT_TEXT_COLOR, DEFAULT_TRIANGLE_SIZE, FREEHAND_STROKE_WIDTH,
    STAMP_GLYPH, STAMP_SIZE, STICKY_FONT_SIZE, STICKY_INSET, STICKY_LABEL_FONT_SIZE, STICKY_SIZE, TEXT_BOX_WIDTH,
    TEXT_FONT_SIZE, TEXT_PLACEHOLDER,
};
use crate::doc::{DrawableObject, Shape, Style};
use crate::input::Tool;

/// Resolve a toolbar identifier. Unknown names fall back to the rectangle tool.
#[must_use]
pub fn parse_tool(name: &str) -> Tool {
    Tool::from_name(name).unwrap_or_else(|| {
        debug!(%name, "factory: unknown tool, using rectangle");
        Tool::Rectangle
    })
}

/// Build the default object for `tool` with its top-left at `pointer`.
///
/// Tools without a single-object form (select, eraser, sticky, freehand)
/// produce the default rectangle; stickies come from [`create_sticky`].
#[must_use]
pub fn create_shape(tool: Tool, pointer: Point, color: &str) -> DrawableObject {
    let (left, top) = (pointer.x, pointer.y);
    match tool {
        Tool::Circle => {
            DrawableObject::new(Shape::Circle { left, top, radius: DEFAULT_CIRCLE_RADIUS }, Style::filled(color))
        }
        Tool::Triangle => DrawableObject::new(
            Shape::Triangle { left, top, width: DEFAULT_TRIANGLE_SIZE, height: DEFAULT_TRIANGLE_SIZE },
            Style::filled(color),
        ),
        Tool::Text => create_text(pointer, TEXT_PLACEHOLDER, TEXT_BOX_WIDTH, TEXT_FONT_SIZE, color),
        Tool::Stamp => create_stamp(pointer),
        Tool::Rectangle | Tool::Select | Tool::Eraser | Tool::Sticky | Tool::Freehand => DrawableObject::new(
            Shape::Rect { left, top, width: DEFAULT_RECT_SIZE, height: DEFAULT_RECT_SIZE },
            Style::filled(color),
        ),
    }
}

/// Text box. Text is drawn in `color`, with no outline.
#[must_use]
pub fn create_text(pointer: Point, text: &str, width: f64, font_size: f64, color: &str) -> DrawableObject {
    let mut style = Style::filled(color);
    style.stroke_width = 0.0;
    DrawableObject::new(
        Shape::Text { left: pointer.x, top: pointer.y, width, text: text.to_string(), font_size },
        style,
    )
}

#[must_use]
pub fn create_stamp(pointer: Point) -> DrawableObject {
    let mut style = Style::filled("transparent");
    style.stroke_width = 0.0;
    DrawableObject::new(
        Shape::Stamp { left: pointer.x, top: pointer.y, glyph: STAMP_GLYPH.to_string(), size: STAMP_SIZE },
        style,
    )
}

/// Siblings of one sticky note, all sharing a group id.
#[derive(Debug, Clone)]
pub struct StickyGroup {
    pub background: DrawableObject,
    pub text: DrawableObject,
    /// Small author line along the bottom, present when the author is known.
    pub label: Option<DrawableObject>,
}

impl StickyGroup {
    /// Siblings from back to front.
    #[must_use]
    pub fn into_objects(self) -> Vec<DrawableObject> {
        let mut out = vec![self.background, self.text];
        out.extend(self.label);
        out
    }
}

/// Sticky note at `pointer`: background in `color`, text inset by
/// [`STICKY_INSET`], and an author label when `author` is given.
#[must_use]
pub fn create_sticky(pointer: Point, color: &str, author: Option<&str>) -> StickyGroup {
    let group = Uuid::new_v4();
    let inner_width = STICKY_SIZE - 2.0 * STICKY_INSET;

    let background = DrawableObject::new(
        Shape::StickyBackground { left: pointer.x, top: pointer.y, width: STICKY_SIZE, height: STICKY_SIZE },
        Style::filled(color),
    )
    .with_group(group);

    let text = create_text(
        Point::new(pointer.x + STICKY_INSET, pointer.y + STICKY_INSET),
        "",
        inner_width,
        STICKY_FONT_SIZE,
        DEFAULT_TEXT_COLOR,
    )
    .with_group(group);

    let label = author.map(|name| {
        let top = pointer.y + STICKY_SIZE - STICKY_INSET - STICKY_LABEL_FONT_SIZE * 1.5;
        create_text(
            Point::new(pointer.x + STICKY_INSET, top),
            name,
            inner_width,
            STICKY_LABEL_FONT_SIZE,
            DEFAULT_TEXT_COLOR,
        )
        .with_group(group)
    });

    StickyGroup { background, text, label }
}

/// Freehand stroke in `color`. The caller checks the point count.
#[must_use]
pub fn create_path(points: Vec<Point>, color: &str) -> DrawableObject {
    DrawableObject::new(Shape::Path { points }, Style::stroked(color, FREEHAND_STROKE_WIDTH))
}

/// Uploaded image with its top-left at `pointer`.
#[must_use]
pub fn create_image(url: &str, pointer: Point, width: f64, height: f64) -> DrawableObject {
    let mut style = Style::filled("transparent");
    style.stroke_width = 0.0;
    DrawableObject::new(
        Shape::Image { left: pointer.x, top: pointer.y, width, height, url: url.to_string() },
        style,
    )
}
