//! Merging externally supplied bodies into a scene.
//!
//! Order matters: balls are added first, then convex polygons (which are
//! checked against the balls just added), then the free-drawn point list
//! is validated. Occluding input is not an error: rejected bodies are
//! kept out and the merge reports `success = false` so the caller can
//! decide whether to proceed, discard, or re-prompt.

use crate::config::Tolerances;
use crate::error::{SimError, SimResult};
use crate::geometry;
use crate::scene::{
    build_circle, build_polygon, AbsoluteConvexPolygon, Body, CircleWithPosition, IntVec2, Scene,
    Shape, UserInput, UserInputStatus, Vec2,
};

/// Merge policy options.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Accept occluding bodies instead of rejecting them. The merge
    /// still reports `success = false`.
    pub allow_occlusions: bool,
    /// Reserved: keep a clearance margin around existing bodies.
    pub keep_space_around_bodies: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            allow_occlusions: false,
            keep_space_around_bodies: true,
        }
    }
}

/// Merge user input against existing scene bodies.
///
/// Returns the accepted bodies and a success flag; the flag is false if
/// anything was rejected or flagged (occlusion, non-convex polygon,
/// out-of-canvas point).
///
/// # Errors
///
/// Returns `OddPointList` if the flattened point list has an odd length
/// (recoverable configuration error).
pub fn merge_user_input(
    user_input: &UserInput,
    scene_bodies: &[Body],
    options: MergeOptions,
    height: i32,
    width: i32,
    tol: &Tolerances,
) -> SimResult<(Vec<Body>, bool)> {
    let mut good = true;
    let mut bodies: Vec<Body> = Vec::new();

    // 1. Adding balls.
    for ball in &user_input.balls {
        let mut has_occlusions = false;
        for scene_body in scene_bodies {
            if ball_occludes_body(ball, scene_body, tol) {
                has_occlusions = true;
                good = false;
                break;
            }
        }
        if !has_occlusions || options.allow_occlusions {
            bodies.push(build_circle(
                ball.position.x,
                ball.position.y,
                ball.radius,
                true,
            ));
        }
    }

    // 2. Adding polygons. Both scene bodies and just-added balls count.
    let num_balls = bodies.len();
    for polygon in &user_input.polygons {
        if !geometry::is_convex_positive_polygon(&polygon.vertices) {
            good = false;
            continue;
        }
        let mut has_occlusions = false;
        for i in 0..scene_bodies.len() + num_balls {
            let scene_body = if i < scene_bodies.len() {
                &scene_bodies[i]
            } else {
                &bodies[i - scene_bodies.len()]
            };
            if polygon_occludes_body(polygon, scene_body, tol) {
                has_occlusions = true;
                good = false;
                break;
            }
        }
        if !has_occlusions || options.allow_occlusions {
            bodies.push(absolute_polygon_to_body(polygon));
        }
    }

    // 3. Validating free-drawn points.
    if user_input.flattened_point_list.is_empty() {
        return Ok((bodies, good));
    }
    if user_input.flattened_point_list.len() % 2 != 0 {
        return Err(SimError::OddPointList {
            len: user_input.flattened_point_list.len(),
        });
    }
    let input_points: Vec<IntVec2> = user_input
        .flattened_point_list
        .chunks_exact(2)
        .map(|pair| IntVec2::new(pair[0], pair[1]))
        .collect();
    let good_points = filter_points_outside_canvas(&input_points, height, width);
    good = good && good_points.len() == input_points.len();

    // Vectorizing the surviving points into bodies (connected-component
    // clustering of the free-drawn stroke) is not implemented; the
    // points are validated and dropped.
    Ok((bodies, good))
}

/// Merge user input into a scene, stamping the occlusion status.
///
/// # Errors
///
/// Returns `OddPointList` if the flattened point list has an odd length.
pub fn add_user_input_to_scene(
    scene: &Scene,
    user_input: &UserInput,
    options: MergeOptions,
    tol: &Tolerances,
) -> SimResult<Scene> {
    let (bodies, success) = merge_user_input(
        user_input,
        &scene.bodies,
        options,
        scene.height,
        scene.width,
        tol,
    )?;
    let mut merged = scene.clone();
    merged.user_input_bodies = bodies;
    merged.user_input_status = if success {
        UserInputStatus::NoOcclusions
    } else {
        UserInputStatus::HadOcclusions
    };
    Ok(merged)
}

fn ball_occludes_body(ball: &CircleWithPosition, body: &Body, tol: &Tolerances) -> bool {
    for shape in &body.shapes {
        match shape {
            Shape::Polygon { vertices } => {
                let relative_center =
                    geometry::reverse_transform(ball.position, body.position, body.angle);
                if geometry::does_ball_occlude_polygon(vertices, relative_center, ball.radius, tol)
                {
                    return true;
                }
            }
            Shape::Circle { radius } => {
                if geometry::is_point_inside_circle(
                    ball.position,
                    body.position,
                    ball.radius + radius,
                    tol,
                ) {
                    return true;
                }
            }
        }
    }
    false
}

fn polygon_occludes_body(polygon: &AbsoluteConvexPolygon, body: &Body, tol: &Tolerances) -> bool {
    for shape in &body.shapes {
        match shape {
            Shape::Polygon { vertices } => {
                let body_polygon: Vec<Vec2> = vertices
                    .iter()
                    .map(|v| geometry::transform(*v, body.position, body.angle))
                    .collect();
                let intersection =
                    geometry::clip_convex_polygons(&polygon.vertices, &body_polygon);
                // Shared edges clip to a zero-area sliver; only a real
                // overlap counts.
                if geometry::polygon_area(&intersection) > tol.insideness {
                    return true;
                }
            }
            Shape::Circle { radius } => {
                if geometry::does_ball_occlude_polygon(
                    &polygon.vertices,
                    body.position,
                    *radius,
                    tol,
                ) {
                    return true;
                }
            }
        }
    }
    false
}

// Re-anchor an absolute polygon on its centroid so the resulting body
// has a meaningful position.
fn absolute_polygon_to_body(polygon: &AbsoluteConvexPolygon) -> Body {
    let n = polygon.vertices.len() as f32;
    let mut center = Vec2::ZERO;
    for v in &polygon.vertices {
        center.x += v.x;
        center.y += v.y;
    }
    center.x /= n;
    center.y /= n;
    let normalized: Vec<Vec2> = polygon
        .vertices
        .iter()
        .map(|v| Vec2::new(v.x - center.x, v.y - center.y))
        .collect();
    build_polygon(center.x, center.y, normalized, 0.0, true)
}

fn filter_points_outside_canvas(points: &[IntVec2], height: i32, width: i32) -> Vec<IntVec2> {
    points
        .iter()
        .filter(|p| p.x >= 0 && p.x < width && p.y >= 0 && p.y < height)
        .copied()
        .collect()
}
