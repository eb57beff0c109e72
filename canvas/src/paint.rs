//! Painting: replays a [`DisplayList`] onto a 2D canvas context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It owns no state; everything it draws comes from the display list and the
//! decoded images the host handed over.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use std::collections::HashMap;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::Point;
use crate::consts::LINE_HEIGHT;
use crate::doc::Bounds;
use crate::render::{DisplayList, DrawCommand, Paint};

/// Selection dash segment length in world units at zoom 1.
const SELECTION_DASH: f64 = 4.0;

/// Draw one frame. `viewport_w` / `viewport_h` are CSS pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn paint(
    ctx: &CanvasRenderingContext2d,
    list: &DisplayList,
    images: &HashMap<String, HtmlImageElement>,
    dpr: f64,
    viewport_w: f64,
    viewport_h: f64,
) -> Result<(), JsValue> {
    for command in &list.commands {
        match command {
            DrawCommand::BeginWorld { pan_x, pan_y, zoom } => {
                ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
                ctx.clear_rect(0.0, 0.0, viewport_w, viewport_h);
                ctx.translate(*pan_x, *pan_y)?;
                ctx.scale(*zoom, *zoom)?;
            }
            DrawCommand::EndWorld => {
                ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
            }
            DrawCommand::Rect { bounds, paint } => draw_rect(ctx, *bounds, paint),
            DrawCommand::Card { bounds, paint } => {
                ctx.save();
                ctx.set_shadow_color("rgba(0, 0, 0, 0.18)");
                ctx.set_shadow_blur(8.0);
                ctx.set_shadow_offset_y(2.0);
                ctx.set_fill_style_str(&paint.fill);
                ctx.fill_rect(bounds.left, bounds.top, bounds.width, bounds.height);
                ctx.restore();
            }
            DrawCommand::Circle { center, radius, paint } => {
                ctx.begin_path();
                ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI)?;
                fill_and_stroke(ctx, paint);
            }
            DrawCommand::Polygon { points, paint } => {
                trace(ctx, points);
                ctx.close_path();
                fill_and_stroke(ctx, paint);
            }
            DrawCommand::Polyline { points, color, width } => {
                ctx.save();
                ctx.set_line_cap("round");
                ctx.set_line_join("round");
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(*width);
                trace(ctx, points);
                ctx.stroke();
                ctx.restore();
            }
            DrawCommand::Text { left, top, max_width, lines, font, font_size, color } => {
                ctx.save();
                ctx.set_font(font);
                ctx.set_text_baseline("top");
                ctx.set_fill_style_str(color);
                let mut y = *top;
                for line in lines {
                    ctx.fill_text_with_max_width(line, *left, y, *max_width)?;
                    y += font_size * LINE_HEIGHT;
                }
                ctx.restore();
            }
            DrawCommand::Glyph { left, top, glyph, size } => {
                ctx.save();
                ctx.set_font(&format!("{size:.0}px sans-serif"));
                ctx.set_text_baseline("top");
                ctx.fill_text(glyph, *left, *top)?;
                ctx.restore();
            }
            DrawCommand::Image { bounds, url } => match images.get(url) {
                Some(image) => ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    bounds.left,
                    bounds.top,
                    bounds.width,
                    bounds.height,
                )?,
                None => draw_placeholder(ctx, *bounds, "Loading…")?,
            },
            DrawCommand::Placeholder { bounds, label } => draw_placeholder(ctx, *bounds, label)?,
            DrawCommand::SelectionOutline { bounds, color, width } => {
                ctx.save();
                let segment = JsValue::from_f64(SELECTION_DASH * width);
                let dash = js_sys::Array::of2(&segment, &segment);
                ctx.set_line_dash(&dash)?;
                ctx.set_stroke_style_str(color);
                ctx.set_line_width(*width);
                ctx.stroke_rect(bounds.left, bounds.top, bounds.width, bounds.height);
                ctx.restore();
            }
            DrawCommand::Cursor { x, y, color, label } => draw_cursor(ctx, Point::new(*x, *y), color, label)?,
        }
    }
    Ok(())
}

fn trace(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        ctx.move_to(first.x, first.y);
    }
    for p in iter {
        ctx.line_to(p.x, p.y);
    }
}

fn fill_and_stroke(ctx: &CanvasRenderingContext2d, paint: &Paint) {
    ctx.set_fill_style_str(&paint.fill);
    ctx.fill();
    if paint.stroke_width > 0.0 {
        ctx.set_stroke_style_str(&paint.stroke);
        ctx.set_line_width(paint.stroke_width);
        ctx.stroke();
    }
}

fn draw_rect(ctx: &CanvasRenderingContext2d, b: Bounds, paint: &Paint) {
    ctx.set_fill_style_str(&paint.fill);
    ctx.fill_rect(b.left, b.top, b.width, b.height);
    if paint.stroke_width > 0.0 {
        ctx.set_stroke_style_str(&paint.stroke);
        ctx.set_line_width(paint.stroke_width);
        ctx.stroke_rect(b.left, b.top, b.width, b.height);
    }
}

fn draw_placeholder(ctx: &CanvasRenderingContext2d, b: Bounds, label: &str) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str("#f3f4f6");
    ctx.fill_rect(b.left, b.top, b.width, b.height);
    ctx.set_stroke_style_str("#9ca3af");
    ctx.set_line_width(1.0);
    ctx.stroke_rect(b.left, b.top, b.width, b.height);
    ctx.set_fill_style_str("#6b7280");
    ctx.set_font("12px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text_with_max_width(label, b.left + b.width / 2.0, b.top + b.height / 2.0, b.width)?;
    ctx.restore();
    Ok(())
}

fn draw_cursor(ctx: &CanvasRenderingContext2d, at: Point, color: &str, label: &str) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(at.x, at.y);
    ctx.line_to(at.x, at.y + 16.0);
    ctx.line_to(at.x + 4.5, at.y + 12.0);
    ctx.line_to(at.x + 11.0, at.y + 12.0);
    ctx.close_path();
    ctx.fill();

    ctx.set_font("12px sans-serif");
    ctx.set_text_baseline("top");
    let width = ctx.measure_text(label)?.width() + 8.0;
    ctx.fill_rect(at.x + 10.0, at.y + 16.0, width, 18.0);
    ctx.set_fill_style_str("#ffffff");
    ctx.fill_text(label, at.x + 14.0, at.y + 19.0)?;
    ctx.restore();
    Ok(())
}
