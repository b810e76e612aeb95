//! Rasterization and featurization of scenes.
//!
//! The raster origin is the bottom-left corner: `y` grows upward in body
//! space, and the image buffer is written row-major from `y = 0` upward.
//! Callers that need top-down display must flip rows themselves.

use crate::scene::{Body, Scene, Shape, ShapeType, Vec2, NUM_COLORS};
use crate::geometry;

/// Number of floats in one body's feature block.
pub const OBJECT_FEATURE_SIZE: usize = 14;

/// Color-indexed raster image, one color code per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Height in pixels.
    pub height: i32,
    /// Width in pixels.
    pub width: i32,
    /// Pixel color codes; 0 is background.
    pub values: Vec<u8>,
}

impl Image {
    /// Create a background-filled image.
    #[must_use]
    pub fn new(height: i32, width: i32) -> Self {
        Self {
            height,
            width,
            values: vec![0; (height.max(0) * width.max(0)) as usize],
        }
    }

    /// Color code at `(x, y)`, bottom-left origin.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.values[(y * self.width + x) as usize]
    }

    fn fill_row(&mut self, y: i32, x_start: i32, x_end: i32, color: u8) {
        let row = (y * self.width) as usize;
        for value in &mut self.values[row + x_start as usize..row + x_end as usize] {
            *value = color;
        }
    }
}

/// Render bodies into a color-indexed raster image.
#[must_use]
pub fn render_bodies(bodies: &[Body], height: i32, width: i32) -> Image {
    let mut image = Image::new(height, width);
    for body in bodies {
        if body.color == 0 {
            continue;
        }
        for shape in &body.shapes {
            match shape {
                Shape::Polygon { vertices } => {
                    let absolute: Vec<Vec2> = vertices
                        .iter()
                        .map(|v| geometry::transform(*v, body.position, body.angle))
                        .collect();
                    fill_convex_polygon(&absolute, body.color, &mut image);
                }
                Shape::Circle { radius } => {
                    fill_circle(
                        body.position.x,
                        body.position.y,
                        *radius,
                        body.color,
                        &mut image,
                    );
                }
            }
        }
    }
    image
}

/// Render a scene: authored bodies first, then user-input bodies.
#[must_use]
pub fn render_scene(scene: &Scene) -> Image {
    let bodies: Vec<Body> = scene
        .bodies
        .iter()
        .chain(scene.user_input_bodies.iter())
        .cloned()
        .collect();
    render_bodies(&bodies, scene.height, scene.width)
}

// Scanline fill of a convex polygon.
//
// Edges are split into a left and a right boundary chain by comparing
// consecutive vertices' y coordinates; an ascending edge bounds the fill
// on the right for counter-clockwise polygons. Each raster row is
// evaluated at its mid-scanline (y + 0.5) by linear interpolation along
// the active edge of each chain.
fn fill_convex_polygon(vertices: &[Vec2], color: u8, image: &mut Image) {
    struct Edge {
        start: Vec2,
        end: Vec2,
    }

    let n = vertices.len();
    let mut left_edges: Vec<Edge> = Vec::new();
    let mut right_edges: Vec<Edge> = Vec::new();
    for i in 0..n {
        let prev = if i == 0 { n - 1 } else { i - 1 };
        if (vertices[i].y - vertices[prev].y).abs() < 1e-3 {
            continue;
        }
        if vertices[prev].y < vertices[i].y {
            right_edges.push(Edge {
                start: vertices[prev],
                end: vertices[i],
            });
        } else {
            left_edges.push(Edge {
                start: vertices[i],
                end: vertices[prev],
            });
        }
    }
    if left_edges.is_empty() || right_edges.is_empty() {
        return;
    }

    left_edges.sort_by(|lhs, rhs| {
        lhs.start
            .y
            .partial_cmp(&rhs.start.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    right_edges.sort_by(|lhs, rhs| {
        lhs.start
            .y
            .partial_cmp(&rhs.start.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let polygon_min_y = vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
    let polygon_max_y = vertices
        .iter()
        .map(|v| v.y)
        .fold(f32::NEG_INFINITY, f32::max);
    let draw_start_y = (polygon_min_y.round() as i32).max(0);
    let draw_end_y = (polygon_max_y.round() as i32).min(image.height);

    let get_x = |edge: &Edge, y: f32| {
        let alpha = (y - edge.start.y) / (edge.end.y - edge.start.y);
        alpha * (edge.end.x - edge.start.x) + edge.start.x
    };

    let mut left_active = 0;
    let mut right_active = 0;
    for y in draw_start_y..draw_end_y {
        let mid = y as f32 + 0.5;
        while left_active + 1 < left_edges.len() && left_edges[left_active].end.y < mid {
            left_active += 1;
        }
        while right_active + 1 < right_edges.len() && right_edges[right_active].end.y < mid {
            right_active += 1;
        }
        let left_x = get_x(&left_edges[left_active], mid);
        let right_x = get_x(&right_edges[right_active], mid);
        let left_int = (left_x.round() as i32).max(0);
        let right_int = (right_x.round() as i32).min(image.width);
        if left_int < right_int {
            image.fill_row(y, left_int, right_int, color);
        }
    }
}

// Symmetric circle fill: sweep rows away from the vertical center in
// both directions, expanding each row's horizontal half-width from
// r^2 - (y - cy)^2.
fn fill_circle(center_x: f32, center_y: f32, radius: f32, color: u8, image: &mut Image) {
    let cx = center_x - 0.5;
    let cy = center_y - 0.5;
    let radius_squared = radius * radius;
    {
        let mut left = cx as i32;
        let mut right = cx as i32;
        let mut y = (cy + radius + 1.0) as i32;
        while y as f32 >= cy {
            expand_row(radius_squared, y, cx, cy, color, &mut left, &mut right, image);
            y -= 1;
        }
    }
    {
        let mut left = cx as i32;
        let mut right = cx as i32;
        let mut y = (cy - radius) as i32;
        while (y as f32) < cy {
            expand_row(radius_squared, y, cx, cy, color, &mut left, &mut right, image);
            y += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn expand_row(
    radius_squared: f32,
    y: i32,
    center_x: f32,
    center_y: f32,
    color: u8,
    left: &mut i32,
    right: &mut i32,
    image: &mut Image,
) {
    let sq = |v: f32| v * v;

    let residual = radius_squared - sq(y as f32 - center_y);
    while sq(*left as f32 - center_x) <= residual {
        *left -= 1;
    }
    while sq(*right as f32 - center_x) <= residual {
        *right += 1;
    }

    let left_int = (*left + 1).max(0);
    let right_int = (*right - 1).min(image.width - 1);
    if left_int <= right_int && y >= 0 && y < image.height {
        image.fill_row(y, left_int, right_int + 1, color);
    }
}

/// Map any angle into `[0, 2*pi)` via floored modulo.
#[must_use]
pub fn wrap_angle_radians(angle: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;
    let wrapped = angle % two_pi;
    if wrapped < 0.0 {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Featurize a scene into fixed-size per-body blocks.
///
/// One block per body whose shape type is defined, in scene order with
/// authored bodies before user-input bodies. Each block is
/// `[x/width, y/height, angle/2pi, diameter/width,
/// one-hot(shape_type, 4), one-hot(color, 6)]`.
#[must_use]
pub fn featurize_scene(scene: &Scene) -> Vec<f32> {
    let mut features = Vec::new();
    for body in scene.bodies.iter().chain(scene.user_input_bodies.iter()) {
        if body.shape_type != ShapeType::Undefined {
            featurize_body(body, scene.height, scene.width, &mut features);
        }
    }
    features
}

fn featurize_body(body: &Body, scene_height: i32, scene_width: i32, features: &mut Vec<f32>) {
    features.push(body.position.x / scene_width as f32);
    features.push(body.position.y / scene_height as f32);
    features.push(wrap_angle_radians(body.angle) / (2.0 * std::f32::consts::PI));
    features.push(body.diameter / scene_width as f32);
    // One-hot encode the shape type and color; code 0 (undefined
    // shape, background color) sets no slot.
    let shape_slot = body.shape_type.code().wrapping_sub(1);
    for i in 0..ShapeType::NUM_DEFINED {
        features.push(if i as u8 == shape_slot { 1.0 } else { 0.0 });
    }
    let color_slot = body.color.wrapping_sub(1);
    for i in 0..NUM_COLORS {
        features.push(if i as u8 == color_slot { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scene::{build_box, build_circle};

    #[test]
    fn test_simple_box_rendering() {
        // Expected image (dots = 0), bottom-left origin:
        //  ......
        //  ......
        //  ......
        //  .11...
        //  .11...
        //  .11...
        //  ......
        let bodies = vec![build_box(1.0, 1.0, 2.0, 3.0, 0.0, false)];
        let image = render_bodies(&bodies, 7, 6);
        assert_eq!(image.height, 7);
        assert_eq!(image.width, 6);
        for y in 0..7 {
            for x in 0..6 {
                let inside = (x == 1 || x == 2) && (1..=3).contains(&y);
                assert_eq!(
                    image.get(x, y),
                    u8::from(inside),
                    "mismatch at position ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_background_color_is_skipped() {
        let mut body = build_box(1.0, 1.0, 2.0, 3.0, 0.0, false);
        body.color = 0;
        let image = render_bodies(&[body], 7, 6);
        assert!(image.values.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_circle_rendering_is_symmetric_and_bounded() {
        let bodies = vec![build_circle(8.0, 8.0, 3.0, false)];
        let image = render_bodies(&bodies, 16, 16);

        let count = image.values.iter().filter(|&&v| v != 0).count();
        // Roughly pi * r^2 pixels.
        assert!(count > 20 && count < 40, "unexpected pixel count {count}");

        // Nothing drawn outside the circle's bounding box.
        for y in 0..16 {
            for x in 0..16 {
                if image.get(x, y) != 0 {
                    assert!((4..=11).contains(&x), "x = {x} out of bounds");
                    assert!((4..=11).contains(&y), "y = {y} out of bounds");
                }
            }
        }
    }

    #[test]
    fn test_circle_clipped_at_canvas_edge() {
        let bodies = vec![build_circle(0.0, 0.0, 3.0, false)];
        let image = render_bodies(&bodies, 8, 8);
        // Only the in-canvas quarter is drawn; no panic, no wraparound.
        assert!(image.values.iter().any(|&v| v != 0));
        assert_eq!(image.get(7, 7), 0);
    }

    #[test]
    fn test_render_scene_includes_user_bodies() {
        let mut scene = Scene::new(16, 16);
        scene.bodies.push(build_box(1.0, 1.0, 2.0, 2.0, 0.0, false));
        scene
            .user_input_bodies
            .push(build_box(10.0, 10.0, 2.0, 2.0, 0.0, true));
        let image = render_scene(&scene);
        assert_ne!(image.get(1, 1), 0);
        assert_ne!(image.get(10, 10), 0);
    }

    #[test]
    fn test_wrap_angle() {
        let two_pi = 2.0 * std::f32::consts::PI;
        assert!(wrap_angle_radians(0.0).abs() < 1e-6);
        assert!((wrap_angle_radians(-std::f32::consts::PI) - std::f32::consts::PI).abs() < 1e-5);
        assert!(wrap_angle_radians(two_pi).abs() < 1e-5);
        assert!((wrap_angle_radians(2.5 * two_pi) - 0.5 * two_pi).abs() < 1e-4);
    }

    #[test]
    fn test_featurize_block_layout() {
        let mut scene = Scene::new(32, 32);
        scene.bodies.push(build_circle(8.0, 16.0, 2.0, true));
        let features = featurize_scene(&scene);
        assert_eq!(features.len(), OBJECT_FEATURE_SIZE);

        assert!((features[0] - 0.25).abs() < 1e-6); // x / width
        assert!((features[1] - 0.5).abs() < 1e-6); // y / height
        assert!(features[2].abs() < 1e-6); // angle
        assert!((features[3] - 0.125).abs() < 1e-6); // diameter / width

        // ShapeType::Ball has code 1: first shape slot.
        assert!((features[4] - 1.0).abs() < 1e-6);
        assert!(features[5..8].iter().all(|&f| f == 0.0));

        // Color 1: first color slot.
        assert!((features[8] - 1.0).abs() < 1e-6);
        assert!(features[9..14].iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_featurize_skips_undefined_shape_type() {
        let mut scene = Scene::new(32, 32);
        scene.bodies.push(build_box(0.0, 0.0, 4.0, 4.0, 0.0, false));
        scene.bodies.push(build_circle(8.0, 8.0, 2.0, true));
        // build_box leaves shape_type undefined; only the ball counts.
        let features = featurize_scene(&scene);
        assert_eq!(features.len(), OBJECT_FEATURE_SIZE);
    }

    #[test]
    fn test_featurize_orders_user_bodies_last() {
        let mut scene = Scene::new(32, 32);
        scene.bodies.push(build_circle(8.0, 8.0, 2.0, true));
        scene.user_input_bodies.push(build_circle(16.0, 8.0, 2.0, true));
        let features = featurize_scene(&scene);
        assert_eq!(features.len(), 2 * OBJECT_FEATURE_SIZE);
        assert!((features[0] - 0.25).abs() < 1e-6);
        assert!((features[OBJECT_FEATURE_SIZE] - 0.5).abs() < 1e-6);
    }
}
