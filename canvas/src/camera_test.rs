#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn point_midpoint() {
    let m = Point::new(100.0, 100.0).midpoint(Point::new(200.0, 180.0));
    assert!(point_approx_eq(m, Point::new(150.0, 140.0)));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom, 1.0);
}

// --- Coordinate conversions ---

#[test]
fn screen_to_world_identity() {
    let cam = Camera::default();
    let world = cam.screen_to_world(Point::new(50.0, 75.0));
    assert!(point_approx_eq(world, Point::new(50.0, 75.0)));
}

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { pan_x: 100.0, pan_y: 50.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(300.0, 250.0));
    assert!(point_approx_eq(world, Point::new(100.0, 100.0)));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let cam = Camera { pan_x: -37.0, pan_y: 12.5, zoom: 0.75 };
    let p = Point::new(123.0, -45.0);
    assert!(point_approx_eq(cam.world_to_screen(cam.screen_to_world(p)), p));
}

#[test]
fn screen_dist_scales_with_zoom() {
    let cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 2.0 };
    assert!(approx_eq(cam.screen_dist_to_world(10.0), 5.0));
}

// --- Zoom ---

#[test]
fn zoom_in_steps_ten_percent() {
    let mut cam = Camera::default();
    cam.zoom_in(Point::new(0.0, 0.0));
    assert!(approx_eq(cam.zoom, 1.1));
}

#[test]
fn zoom_out_steps_ten_percent() {
    let mut cam = Camera::default();
    cam.zoom_out(Point::new(0.0, 0.0));
    assert!(approx_eq(cam.zoom, 0.9));
}

#[test]
fn zoom_keeps_point_under_cursor_fixed() {
    let mut cam = Camera { pan_x: 20.0, pan_y: -10.0, zoom: 1.0 };
    let screen = Point::new(400.0, 300.0);
    let before = cam.screen_to_world(screen);
    cam.zoom_to_point(screen, 1.7);
    let after = cam.screen_to_world(screen);
    assert!(point_approx_eq(before, after));
}

#[test]
fn repeated_zoom_in_never_exceeds_max() {
    let mut cam = Camera::default();
    for _ in 0..100 {
        cam.zoom_in(Point::new(10.0, 10.0));
        assert!(cam.zoom <= MAX_ZOOM);
    }
    assert!(approx_eq(cam.zoom, MAX_ZOOM));
}

#[test]
fn repeated_zoom_out_never_goes_below_min() {
    let mut cam = Camera::default();
    for _ in 0..100 {
        cam.zoom_out(Point::new(10.0, 10.0));
        assert!(cam.zoom >= MIN_ZOOM);
    }
    assert!(approx_eq(cam.zoom, MIN_ZOOM));
}

#[test]
fn clamped_zoom_leaves_pan_alone() {
    let mut cam = Camera { pan_x: 5.0, pan_y: 6.0, zoom: MAX_ZOOM };
    cam.zoom_to_point(Point::new(100.0, 100.0), 2.0);
    assert_eq!(cam.pan_x, 5.0);
    assert_eq!(cam.pan_y, 6.0);
}

// --- Pan ---

#[test]
fn pan_to_is_absolute() {
    let mut cam = Camera::default();
    cam.pan_by(10.0, 10.0);
    cam.pan_to(-50.0, 25.0);
    assert_eq!(cam.pan_x, -50.0);
    assert_eq!(cam.pan_y, 25.0);
}

#[test]
fn pan_by_accumulates() {
    let mut cam = Camera::default();
    cam.pan_by(10.0, -5.0);
    cam.pan_by(2.0, 1.0);
    assert_eq!(cam.pan_x, 12.0);
    assert_eq!(cam.pan_y, -4.0);
}

#[test]
fn reset_restores_identity() {
    let mut cam = Camera { pan_x: 3.0, pan_y: 4.0, zoom: 2.0 };
    cam.reset();
    assert_eq!(cam, Camera::default());
}
