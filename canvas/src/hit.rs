//! Hit-testing a world-space point against one object.
//!
//! Filled shapes hit on their interior. Freehand paths hit within half the
//! stroke width plus a screen-space slop converted to world units.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Point;
use crate::doc::{DrawableObject, Shape};

/// Whether `p` (world) falls on `obj`. `slop` is in world units.
#[must_use]
pub fn contains(obj: &DrawableObject, p: Point, slop: f64) -> bool {
    match &obj.shape {
        Shape::Circle { left, top, radius } => {
            let center = Point::new(left + radius, top + radius);
            center.distance(p) <= radius + slop
        }
        Shape::Triangle { left, top, width, height } => {
            let apex = Point::new(left + width / 2.0, *top);
            let bottom_left = Point::new(*left, top + height);
            let bottom_right = Point::new(left + width, top + height);
            point_in_triangle(p, apex, bottom_left, bottom_right)
        }
        Shape::Path { points } => {
            let reach = obj.style.stroke_width / 2.0 + slop;
            match points.as_slice() {
                [] => false,
                [only] => only.distance(p) <= reach,
                _ => points.windows(2).any(|w| distance_to_segment(p, w[0], w[1]) <= reach),
            }
        }
        _ => obj.bounds().contains(p),
    }
}

/// Barycentric sign test; points on an edge count as inside.
#[must_use]
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn cross(p: Point, a: Point, b: Point) -> f64 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

/// Shortest distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}
