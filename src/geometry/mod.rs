//! Pure 2D math and predicates.
//!
//! Everything here is a stateless function over `Vec2`; nothing touches
//! the physics engine. Predicates that absorb floating-point jitter take
//! the configured `Tolerances` explicitly. The tolerance bias is
//! conservative on purpose: touching counts as occlusion and as
//! insideness.

use crate::config::Tolerances;
use crate::scene::Vec2;

/// Rotate a point around the origin.
#[must_use]
pub fn rotate(point: Vec2, angle: f32) -> Vec2 {
    let cos_angle = angle.cos();
    let sin_angle = angle.sin();
    Vec2::new(
        point.x * cos_angle - point.y * sin_angle,
        point.x * sin_angle + point.y * cos_angle,
    )
}

/// Shift a point.
#[must_use]
pub fn translate(point: Vec2, shift: Vec2) -> Vec2 {
    Vec2::new(point.x + shift.x, point.y + shift.y)
}

/// Rotate a point around the origin, then shift it.
#[must_use]
pub fn transform(point: Vec2, shift: Vec2, angle: f32) -> Vec2 {
    translate(rotate(point, angle), shift)
}

/// Undo a shift.
#[must_use]
pub fn reverse_translate(point: Vec2, shift: Vec2) -> Vec2 {
    Vec2::new(point.x - shift.x, point.y - shift.y)
}

/// Undo a shift-then-rotation: the inverse of [`transform`].
#[must_use]
pub fn reverse_transform(point: Vec2, shift: Vec2, angle: f32) -> Vec2 {
    rotate(reverse_translate(point, shift), -angle)
}

/// Dot product.
#[must_use]
pub fn inner_product(p1: Vec2, p2: Vec2) -> f32 {
    p1.x * p2.x + p1.y * p2.y
}

/// Z component of the 2D cross product.
#[must_use]
pub fn cross_product(v1: Vec2, v2: Vec2) -> f32 {
    v1.x * v2.y - v1.y * v2.x
}

/// Squared Euclidean distance between two points.
#[must_use]
pub fn square_distance(p1: Vec2, p2: Vec2) -> f32 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    dx * dx + dy * dy
}

/// Vector from `start` to `end`.
#[must_use]
pub fn vector_to(start: Vec2, end: Vec2) -> Vec2 {
    Vec2::new(end.x - start.x, end.y - start.y)
}

/// Whether every consecutive vertex triple turns counter-clockwise.
///
/// Collinear triples (zero cross product) fail the test.
#[must_use]
pub fn is_convex_positive_polygon(points: &[Vec2]) -> bool {
    let n = points.len();
    for i in 0..n {
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];
        if cross_product(vector_to(p1, p2), vector_to(p2, p3)) <= 0.0 {
            return false;
        }
    }
    true
}

/// Strict point-in-polygon test for counter-clockwise convex polygons.
///
/// Boundary points are classified outside.
#[must_use]
pub fn is_inside_polygon(polygon: &[Vec2], point: Vec2) -> bool {
    let n = polygon.len();
    for i in 0..n {
        let j = if i == 0 { n - 1 } else { i - 1 };
        if cross_product(
            vector_to(polygon[j], polygon[i]),
            vector_to(polygon[j], point),
        ) <= 0.0
        {
            return false;
        }
    }
    true
}

/// Squared distance from a point to a segment.
///
/// Uses the closest-point-on-segment formula with projection clamping;
/// segments shorter than the zero-length-edge tolerance collapse to their
/// left endpoint.
#[must_use]
pub fn square_distance_to_segment(left: Vec2, right: Vec2, point: Vec2, tol: &Tolerances) -> f32 {
    let left_right = vector_to(left, right);
    let projection_length = inner_product(left_right, vector_to(left, point));
    let square_edge_length = square_distance(left, right);
    if projection_length < 0.0 || square_edge_length < tol.zero_length_edge {
        square_distance(left, point)
    } else if projection_length > square_edge_length {
        square_distance(right, point)
    } else {
        let num = left_right.y * point.x - left_right.x * point.y + right.x * left.y
            - right.y * left.x;
        num * num / square_edge_length
    }
}

/// Squared distance from a point to a polygon boundary.
#[must_use]
pub fn square_distance_to_polygon(polygon: &[Vec2], point: Vec2, tol: &Tolerances) -> f32 {
    let n = polygon.len();
    let mut best = square_distance_to_segment(polygon[n - 1], polygon[0], point, tol);
    for i in 0..n - 1 {
        best = best.min(square_distance_to_segment(
            polygon[i],
            polygon[i + 1],
            point,
            tol,
        ));
    }
    best
}

/// Whether a circle has non-zero intersection with a polygon.
///
/// Touching is ok: the insideness tolerance keeps grazing contact from
/// counting as occlusion.
#[must_use]
pub fn does_ball_occlude_polygon(
    polygon: &[Vec2],
    center: Vec2,
    radius: f32,
    tol: &Tolerances,
) -> bool {
    if is_inside_polygon(polygon, center) {
        return true;
    }
    let sq = square_distance_to_polygon(polygon, center, tol);
    sq.sqrt() + tol.insideness < radius
}

/// Whether a point lies strictly inside a circle. Touching is ok.
#[must_use]
pub fn is_point_inside_circle(point: Vec2, center: Vec2, radius: f32, tol: &Tolerances) -> bool {
    square_distance(point, center).sqrt() + tol.insideness < radius
}

/// Signed area of a polygon (positive for counter-clockwise order).
#[must_use]
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];
        twice_area += cross_product(p1, p2);
    }
    twice_area / 2.0
}

/// Clip one convex polygon by another (Sutherland-Hodgman).
///
/// Both polygons must be counter-clockwise. The result may be empty or
/// degenerate (zero area) when the inputs only touch; callers deciding
/// occlusion should test `polygon_area` of the result rather than
/// emptiness.
#[must_use]
pub fn clip_convex_polygons(subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec2> {
    let mut output: Vec<Vec2> = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % n];
        let input = std::mem::take(&mut output);
        let m = input.len();
        for j in 0..m {
            let previous = input[(j + m - 1) % m];
            let current = input[j];
            let previous_side = cross_product(vector_to(a, b), vector_to(a, previous));
            let current_side = cross_product(vector_to(a, b), vector_to(a, current));
            let crossing = (previous_side >= 0.0) != (current_side >= 0.0);
            if crossing {
                if let Some(p) = edge_line_intersection(previous, current, previous_side, current_side)
                {
                    output.push(p);
                }
            }
            if current_side >= 0.0 {
                output.push(current);
            }
        }
    }
    output
}

// Intersection of the segment previous->current with the clip line, given
// the signed side values of both endpoints.
fn edge_line_intersection(
    previous: Vec2,
    current: Vec2,
    previous_side: f32,
    current_side: f32,
) -> Option<Vec2> {
    let denom = previous_side - current_side;
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let t = previous_side / denom;
    Some(Vec2::new(
        previous.x + t * (current.x - previous.x),
        previous.y + t * (current.y - previous.y),
    ))
}
