//! Scene data model: vectors, shapes, bodies, scenes, and user input.
//!
//! A `Scene` is the complete set of bodies at one instant plus the canvas
//! dimensions. Body identity is positional: a body is identified by its
//! index within `bodies` or `user_input_bodies`, and those indices stay
//! stable across every simulation step.

pub mod task;

use serde::{Deserialize, Serialize};

/// 2D vector in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D vector in integer pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntVec2 {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl IntVec2 {
    /// Create a new integer vector.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rigid shape, relative to its body's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Convex polygon with counter-clockwise vertex order.
    Polygon {
        /// Vertices relative to the body origin.
        vertices: Vec<Vec2>,
    },
    /// Circle centered on the body origin.
    Circle {
        /// Radius in pixels.
        radius: f32,
    },
}

/// Static/dynamic classification of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyType {
    /// Immovable body.
    #[default]
    Static,
    /// Body subject to gravity and contacts.
    Dynamic,
}

/// High-level shape classification used by featurization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShapeType {
    /// Not classified; skipped by the featurizer.
    #[default]
    Undefined,
    /// Ball.
    Ball,
    /// Horizontal bar.
    Bar,
    /// Jar (open container).
    Jar,
    /// Standing sticks.
    StandingSticks,
}

impl ShapeType {
    /// Number of defined shape classes (excluding `Undefined`).
    pub const NUM_DEFINED: usize = 4;

    /// Numeric code; `Undefined` is 0, defined classes are 1-based.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Undefined => 0,
            Self::Ball => 1,
            Self::Bar => 2,
            Self::Jar => 3,
            Self::StandingSticks => 4,
        }
    }
}

/// Number of foreground color codes used by rendering and featurization.
/// Color 0 is the background and is never drawn.
pub const NUM_COLORS: usize = 6;

/// A rigid body: one or more shapes sharing a pose.
///
/// Position and angle are in the scene's pixel space at rest and are
/// updated in place by the scene write-back after simulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    /// Position of the body origin, pixels.
    pub position: Vec2,
    /// Rotation around the body origin, radians.
    pub angle: f32,
    /// Static/dynamic classification.
    pub body_type: BodyType,
    /// Shapes relative to the body origin.
    pub shapes: Vec<Shape>,
    /// Color code; 0 is background.
    pub color: u8,
    /// Shape classification for featurization.
    pub shape_type: ShapeType,
    /// Characteristic size in pixels.
    pub diameter: f32,
}

/// Result of merging user input into a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserInputStatus {
    /// No user input has been merged.
    #[default]
    Undefined,
    /// User input merged without occlusions.
    NoOcclusions,
    /// User input occluded existing bodies.
    HadOcclusions,
}

/// The complete set of bodies at one instant, plus canvas dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Bodies placed by the task author.
    pub bodies: Vec<Body>,
    /// Bodies supplied by the agent/user.
    pub user_input_bodies: Vec<Body>,
    /// Canvas width in pixels.
    pub width: i32,
    /// Canvas height in pixels.
    pub height: i32,
    /// Occlusion status of the merged user input.
    pub user_input_status: UserInputStatus,
}

impl Scene {
    /// Create an empty scene with the given canvas dimensions.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            bodies: Vec::new(),
            user_input_bodies: Vec::new(),
            width,
            height,
            user_input_status: UserInputStatus::Undefined,
        }
    }
}

/// A circle placed in absolute scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleWithPosition {
    /// Center in pixels.
    pub position: Vec2,
    /// Radius in pixels.
    pub radius: f32,
}

/// A convex polygon given in absolute scene coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteConvexPolygon {
    /// Vertices in counter-clockwise order.
    pub vertices: Vec<Vec2>,
}

/// Externally supplied bodies to merge into a scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInput {
    /// Convex polygons in absolute coordinates.
    pub polygons: Vec<AbsoluteConvexPolygon>,
    /// Balls in absolute coordinates.
    pub balls: Vec<CircleWithPosition>,
    /// Free-drawn points, x,y interleaved.
    pub flattened_point_list: Vec<i32>,
}

/// Build a box body anchored at its lower-left corner.
#[must_use]
pub fn build_box(x: f32, y: f32, width: f32, height: f32, angle: f32, dynamic: bool) -> Body {
    let mut vertices = Vec::with_capacity(4);
    for i in 0..4 {
        let on_right = i == 1 || i == 2;
        let on_top = i == 2 || i == 3;
        vertices.push(Vec2::new(
            if on_right { width } else { 0.0 },
            if on_top { height } else { 0.0 },
        ));
    }
    build_polygon(x, y, vertices, angle, dynamic)
}

/// Build a circle body.
#[must_use]
pub fn build_circle(x: f32, y: f32, radius: f32, dynamic: bool) -> Body {
    Body {
        position: Vec2::new(x, y),
        angle: 0.0,
        body_type: if dynamic {
            BodyType::Dynamic
        } else {
            BodyType::Static
        },
        shapes: vec![Shape::Circle { radius }],
        color: 1,
        shape_type: ShapeType::Ball,
        diameter: 2.0 * radius,
    }
}

/// Build a polygon body from vertices relative to `(x, y)`.
#[must_use]
pub fn build_polygon(x: f32, y: f32, vertices: Vec<Vec2>, angle: f32, dynamic: bool) -> Body {
    Body {
        position: Vec2::new(x, y),
        angle,
        body_type: if dynamic {
            BodyType::Dynamic
        } else {
            BodyType::Static
        },
        shapes: vec![Shape::Polygon { vertices }],
        color: 1,
        shape_type: ShapeType::Undefined,
        diameter: 0.0,
    }
}
