//! Rendering: turn the scene into a flat display list.
//!
//! DESIGN
//! ======
//! Building the list is pure. The same objects, selection, viewport and
//! cursors always produce the same commands, so rendering twice without a
//! mutation is a no-op on screen. Painting the list is a separate step
//! (`paint` behind the `web` feature) that only replays commands.
//!
//! Commands between [`DrawCommand::BeginWorld`] and [`DrawCommand::EndWorld`]
//! are in world coordinates; cursor glyphs after it are in screen pixels.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::camera::Point;
use crate::consts::{SELECTION_COLOR, SELECTION_PADDING_PX};
use crate::doc::{Bounds, DrawableObject, Shape, Style};
use crate::presence::CursorGlyph;
use crate::scene::{ImageStatus, SceneSurface};

/// Fill and outline for one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl From<&Style> for Paint {
    fn from(style: &Style) -> Self {
        Self { fill: style.fill.clone(), stroke: style.stroke.clone(), stroke_width: style.stroke_width }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Clear the viewport and apply the camera transform.
    BeginWorld { pan_x: f64, pan_y: f64, zoom: f64 },
    Rect { bounds: Bounds, paint: Paint },
    /// Sticky-note card: a rect with a soft drop shadow.
    Card { bounds: Bounds, paint: Paint },
    Circle { center: Point, radius: f64, paint: Paint },
    Polygon { points: Vec<Point>, paint: Paint },
    Polyline { points: Vec<Point>, color: String, width: f64 },
    Text { left: f64, top: f64, max_width: f64, lines: Vec<String>, font: String, font_size: f64, color: String },
    Glyph { left: f64, top: f64, glyph: String, size: f64 },
    Image { bounds: Bounds, url: String },
    /// Stand-in for an image that is still decoding or failed to.
    Placeholder { bounds: Bounds, label: String },
    SelectionOutline { bounds: Bounds, color: String, width: f64 },
    EndWorld,
    /// Remote pointer, screen coordinates.
    Cursor { x: f64, y: f64, color: String, label: String },
}

/// Ordered drawing instructions for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
}

impl DisplayList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Build the display list for `scene` plus remote cursors.
#[must_use]
pub fn build(scene: &SceneSurface, cursors: &[CursorGlyph]) -> DisplayList {
    let camera = scene.camera();
    let mut commands = vec![DrawCommand::BeginWorld { pan_x: camera.pan_x, pan_y: camera.pan_y, zoom: camera.zoom }];

    for obj in scene.ordered() {
        object_commands(obj, scene, &mut commands);
    }

    let padding = camera.screen_dist_to_world(SELECTION_PADDING_PX);
    let width = camera.screen_dist_to_world(1.5);
    for obj in scene.get_active_objects() {
        commands.push(DrawCommand::SelectionOutline {
            bounds: obj.bounds().inflate(padding),
            color: SELECTION_COLOR.to_string(),
            width,
        });
    }
    commands.push(DrawCommand::EndWorld);

    for cursor in cursors {
        let screen = camera.world_to_screen(cursor.world);
        commands.push(DrawCommand::Cursor {
            x: screen.x,
            y: screen.y,
            color: cursor.color.to_string(),
            label: cursor.label.clone(),
        });
    }

    DisplayList { commands }
}

fn object_commands(obj: &DrawableObject, scene: &SceneSurface, out: &mut Vec<DrawCommand>) {
    let paint = Paint::from(&obj.style);
    match &obj.shape {
        Shape::Rect { .. } => out.push(DrawCommand::Rect { bounds: obj.bounds(), paint }),
        Shape::StickyBackground { .. } => out.push(DrawCommand::Card { bounds: obj.bounds(), paint }),
        Shape::Circle { left, top, radius } => {
            out.push(DrawCommand::Circle { center: Point::new(left + radius, top + radius), radius: *radius, paint });
        }
        Shape::Triangle { left, top, width, height } => out.push(DrawCommand::Polygon {
            points: vec![
                Point::new(left + width / 2.0, *top),
                Point::new(left + width, top + height),
                Point::new(*left, top + height),
            ],
            paint,
        }),
        Shape::Text { left, top, width, text, font_size } => {
            if text.trim().is_empty() {
                return;
            }
            out.push(DrawCommand::Text {
                left: *left,
                top: *top,
                max_width: *width,
                lines: text.lines().map(str::to_string).collect(),
                font: format!("{font_size:.0}px {}", obj.style.font_family),
                font_size: *font_size,
                color: obj.style.fill.clone(),
            });
        }
        Shape::Path { points } => {
            if points.len() < 2 {
                return;
            }
            out.push(DrawCommand::Polyline {
                points: points.clone(),
                color: obj.style.stroke.clone(),
                width: obj.style.stroke_width,
            });
        }
        Shape::Stamp { left, top, glyph, size } => {
            out.push(DrawCommand::Glyph { left: *left, top: *top, glyph: glyph.clone(), size: *size });
        }
        Shape::Image { url, .. } => {
            let bounds = obj.bounds();
            match scene.image_status(url) {
                ImageStatus::Loaded => out.push(DrawCommand::Image { bounds, url: url.clone() }),
                ImageStatus::Pending => out.push(DrawCommand::Placeholder { bounds, label: "Loading…".to_string() }),
                ImageStatus::Failed => {
                    out.push(DrawCommand::Placeholder { bounds, label: "Image unavailable".to_string() });
                }
            }
        }
    }
}
