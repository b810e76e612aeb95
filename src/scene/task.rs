//! Tasks: a scene plus a goal predicate, and the simulation result type.

use serde::{Deserialize, Serialize};

use crate::scene::{Scene, Shape};

/// A spatial relationship between two bodies.
///
/// A task's goal holds when all of its relationships hold simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpatialRelationship {
    /// Never holds.
    None,
    /// Body 1's bounding box is entirely above body 2's.
    Above,
    /// Body 1's bounding box is entirely below body 2's.
    Below,
    /// Body 1's bounding box is entirely left of body 2's.
    LeftOf,
    /// Body 1's bounding box is entirely right of body 2's.
    RightOf,
    /// The bodies are in active contact.
    Touching,
    /// The bodies are in active contact; a single touch suffices.
    TouchingBriefly,
    /// Body 1 lies inside the phantom shape placed at body 2's pose.
    Inside,
    /// Negation of `Touching`, with bespoke temporal acceptance.
    NotTouching,
    /// Negation of `Inside`.
    NotInside,
}

impl SpatialRelationship {
    /// Whether evaluating this relationship requires a phantom shape.
    #[must_use]
    pub const fn requires_phantom(self) -> bool {
        matches!(self, Self::Inside | Self::NotInside)
    }
}

/// A scene plus a goal: two body references, a conjunction of spatial
/// relationships, and an optional phantom shape for containment goals.
///
/// Tasks are immutable inputs to the simulation core; the core never
/// mutates a task's relationships, body ids, or phantom shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The initial scene.
    pub scene: Scene,
    /// Index of the first goal body within `scene.bodies`.
    pub body_id1: usize,
    /// Index of the second goal body within `scene.bodies`.
    pub body_id2: usize,
    /// All must hold simultaneously for the goal to hold.
    pub relationships: Vec<SpatialRelationship>,
    /// Containment polygon for INSIDE/NOT_INSIDE, placed at body 2's pose.
    /// Not itself simulated.
    pub phantom_shape: Option<Shape>,
    /// Benchmark tier label.
    pub tier: String,
}

impl Task {
    /// Whether any relationship requires the phantom shape.
    #[must_use]
    pub fn requires_phantom(&self) -> bool {
        self.relationships
            .iter()
            .any(|r| r.requires_phantom())
    }
}

/// Compact trajectory of one simulated task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSimulation {
    /// Scene snapshots at stride boundaries.
    pub scene_list: Vec<Scene>,
    /// Solved flags at stride boundaries.
    pub solved_state_list: Vec<bool>,
    /// Whether the goal was durably satisfied.
    pub is_solution: bool,
    /// Number of engine steps executed (may be less than the maximum on
    /// early solved exit).
    pub steps_simulated: usize,
}
