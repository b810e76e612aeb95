//! Scene to physics-world conversion and back.
//!
//! Two types of units are used in this module: pixels and meters. Pixels
//! refer to units in `Scene`, meters refer to units inside the physics
//! engine. They are converted through the configured pixel/meter scale.
//!
//! Every engine body carries a `BodyTag` in an explicit side table owned
//! by `TaggedWorld`, keyed by the engine's body handle and kept in
//! insertion order. The engine itself never sees the tag; this replaces
//! the untyped per-body user-data pointer such engines offer.

use nalgebra::{Point2, Vector2};
use rapier2d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    QueryPipeline, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use std::num::NonZeroUsize;

use crate::config::{PhysicsConfig, SimConfig};
use crate::error::{SimError, SimResult};
use crate::scene::{build_polygon, Body, BodyType, Scene, Shape, Vec2};

/// Origin of a tagged body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Body from `Scene::bodies`.
    General,
    /// Body from `Scene::user_input_bodies`.
    User,
    /// Canvas-edge wall added by the dilated world variant; never written
    /// back to the scene and skipped by goal evaluation.
    BoundingBox,
}

/// Stable identity of an engine body: the index within its source array
/// plus which array it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyTag {
    /// Index within the source body array.
    pub object_id: usize,
    /// Which source array the body came from.
    pub kind: ObjectKind,
}

/// Axis-aligned bounding box in world (meter) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldAabb {
    /// Lower corner.
    pub lower: Vec2,
    /// Upper corner.
    pub upper: Vec2,
}

/// A physics world whose bodies are tagged with stable scene identities.
///
/// Owns the full engine pipeline state for one simulation; created fresh
/// per simulation call and discarded at the end.
pub struct TaggedWorld {
    gravity: Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    /// Tag side table, in body-insertion order.
    tags: Vec<(RigidBodyHandle, BodyTag)>,
}

impl TaggedWorld {
    /// Create a world containing the scene's bodies and user-input bodies.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a polygon shape is degenerate.
    pub fn from_scene(scene: &Scene, config: &SimConfig) -> SimResult<Self> {
        let mut world = Self::empty(config);
        world.add_bodies(&scene.bodies, ObjectKind::General, &config.physics)?;
        world.add_bodies(&scene.user_input_bodies, ObjectKind::User, &config.physics)?;
        Ok(world)
    }

    /// Create a world with four static walls around the canvas edges.
    ///
    /// The walls are tagged `BoundingBox`; they keep bodies on the canvas
    /// in dilated runs but are invisible to goal evaluation and scene
    /// write-back.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a polygon shape is degenerate.
    pub fn from_scene_with_bounding_boxes(scene: &Scene, config: &SimConfig) -> SimResult<Self> {
        let mut world = Self::from_scene(scene, config)?;
        let width = scene.width as f32;
        let height = scene.height as f32;
        let walls = vec![
            build_static_box(0.0, 0.0, width, -10.0),
            build_static_box(0.0, height, width, 10.0),
            build_static_box(0.0, 0.0, -10.0, height),
            build_static_box(width, 0.0, 10.0, height),
        ];
        world.add_bodies(&walls, ObjectKind::BoundingBox, &config.physics)?;
        Ok(world)
    }

    fn empty(config: &SimConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.solver.timestep;
        if let Some(iterations) = NonZeroUsize::new(config.solver.velocity_iterations) {
            integration_parameters.num_solver_iterations = iterations;
        }
        integration_parameters.num_internal_pgs_iterations =
            config.solver.position_iterations.max(1);

        Self {
            gravity: Vector2::new(0.0, config.physics.gravity_y),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            tags: Vec::new(),
        }
    }

    fn add_bodies(
        &mut self,
        bodies: &[Body],
        kind: ObjectKind,
        physics: &PhysicsConfig,
    ) -> SimResult<()> {
        for (object_id, body) in bodies.iter().enumerate() {
            let builder = match body.body_type {
                BodyType::Dynamic => RigidBodyBuilder::dynamic(),
                BodyType::Static => RigidBodyBuilder::fixed(),
            };
            let rigid_body = builder
                .translation(Vector2::new(
                    physics.p2m(body.position.x),
                    physics.p2m(body.position.y),
                ))
                .rotation(body.angle)
                .linear_damping(physics.linear_damping)
                .angular_damping(physics.angular_damping)
                .build();
            let handle = self.bodies.insert(rigid_body);
            self.tags.push((handle, BodyTag { object_id, kind }));

            for shape in &body.shapes {
                let mut collider = match shape {
                    Shape::Polygon { vertices } => {
                        let points: Vec<Point2<f32>> = vertices
                            .iter()
                            .map(|v| Point2::new(physics.p2m(v.x), physics.p2m(v.y)))
                            .collect();
                        ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                            SimError::config(format!(
                                "Degenerate polygon shape on body {object_id}"
                            ))
                        })?
                    }
                    Shape::Circle { radius } => ColliderBuilder::ball(physics.p2m(*radius)),
                }
                .friction(physics.friction)
                .restitution(physics.restitution);
                if body.body_type == BodyType::Dynamic {
                    // Non-zero density is what makes the body dynamic.
                    collider = collider.density(physics.density);
                }
                self.colliders
                    .insert_with_parent(collider.build(), handle, &mut self.bodies);
            }
        }
        Ok(())
    }

    /// Advance the world by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Write the current body poses back into a clone of `scene`.
    ///
    /// Walks the tag table in insertion order; bounding-box bodies are
    /// skipped. Positions come back in pixels, angles in radians.
    ///
    /// # Errors
    ///
    /// Returns a fatal invariant error if a tagged body vanished from the
    /// engine or its tag points at a missing scene slot.
    pub fn write_back_scene(&self, scene: &Scene, physics: &PhysicsConfig) -> SimResult<Scene> {
        let mut new_scene = scene.clone();
        for (handle, tag) in &self.tags {
            let object_list = match tag.kind {
                ObjectKind::BoundingBox => continue,
                ObjectKind::General => &mut new_scene.bodies,
                ObjectKind::User => &mut new_scene.user_input_bodies,
            };
            let rigid_body = self.bodies.get(*handle).ok_or(SimError::UntaggedBody)?;
            let body = object_list.get_mut(tag.object_id).ok_or(SimError::TagMismatch {
                object_id: tag.object_id,
            })?;
            let translation = rigid_body.translation();
            body.position = Vec2::new(physics.m2p(translation.x), physics.m2p(translation.y));
            body.angle = rigid_body.rotation().angle();
        }
        Ok(new_scene)
    }

    /// Find the handle of the body tagged `(kind, object_id)`.
    #[must_use]
    pub fn find_tagged_body(&self, kind: ObjectKind, object_id: usize) -> Option<RigidBodyHandle> {
        self.tags
            .iter()
            .find(|(_, tag)| tag.kind == kind && tag.object_id == object_id)
            .map(|(handle, _)| *handle)
    }

    /// Look up the tag of an engine body.
    ///
    /// # Errors
    ///
    /// Returns a fatal invariant error for a handle with no tag entry.
    pub fn tag_of(&self, handle: RigidBodyHandle) -> SimResult<BodyTag> {
        self.tags
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, tag)| *tag)
            .ok_or(SimError::UntaggedBody)
    }

    /// Whether the two bodies have any active contact.
    #[must_use]
    pub fn bodies_in_contact(&self, h1: RigidBodyHandle, h2: RigidBodyHandle) -> bool {
        let (Some(body1), Some(body2)) = (self.bodies.get(h1), self.bodies.get(h2)) else {
            return false;
        };
        for &c1 in body1.colliders() {
            for &c2 in body2.colliders() {
                if let Some(pair) = self.narrow_phase.contact_pair(c1, c2) {
                    if pair.has_any_active_contact {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Axis-aligned bounding box of a body's collider geometry at its
    /// current transform, in meters.
    ///
    /// # Errors
    ///
    /// Returns a fatal invariant error if the body vanished from the
    /// engine.
    pub fn body_aabb(&self, handle: RigidBodyHandle) -> SimResult<WorldAabb> {
        let body = self.bodies.get(handle).ok_or(SimError::UntaggedBody)?;
        let mut result: Option<WorldAabb> = None;
        for &collider_handle in body.colliders() {
            if let Some(collider) = self.colliders.get(collider_handle) {
                let aabb = collider.compute_aabb();
                let lower = Vec2::new(aabb.mins.x, aabb.mins.y);
                let upper = Vec2::new(aabb.maxs.x, aabb.maxs.y);
                result = Some(match result {
                    None => WorldAabb { lower, upper },
                    Some(prev) => WorldAabb {
                        lower: Vec2::new(prev.lower.x.min(lower.x), prev.lower.y.min(lower.y)),
                        upper: Vec2::new(prev.upper.x.max(upper.x), prev.upper.y.max(upper.y)),
                    },
                });
            }
        }
        result.ok_or(SimError::UntaggedBody)
    }

    /// World position of a body, in meters.
    #[must_use]
    pub fn position_of(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        self.bodies
            .get(handle)
            .map(|rb| Vec2::new(rb.translation().x, rb.translation().y))
    }

    /// World pose of a body: position in meters plus angle in radians.
    #[must_use]
    pub fn pose_of(&self, handle: RigidBodyHandle) -> Option<(Vec2, f32)> {
        self.bodies.get(handle).map(|rb| {
            (
                Vec2::new(rb.translation().x, rb.translation().y),
                rb.rotation().angle(),
            )
        })
    }

    /// Radius of a body's first collider if it is a circle, in meters.
    #[must_use]
    pub fn circle_radius(&self, handle: RigidBodyHandle) -> Option<f32> {
        let body = self.bodies.get(handle)?;
        let collider = self.colliders.get(*body.colliders().first()?)?;
        collider.shape().as_ball().map(|ball| ball.radius)
    }

    /// Collider shapes of a body, in world (meter) coordinates:
    /// circles as `(center, radius)`, polygons as absolute vertex lists.
    #[must_use]
    pub fn body_world_shapes(&self, handle: RigidBodyHandle) -> Vec<WorldShape> {
        let Some(body) = self.bodies.get(handle) else {
            return Vec::new();
        };
        let mut shapes = Vec::new();
        for &collider_handle in body.colliders() {
            let Some(collider) = self.colliders.get(collider_handle) else {
                continue;
            };
            if let Some(ball) = collider.shape().as_ball() {
                let center = collider.position().translation.vector;
                shapes.push(WorldShape::Circle {
                    center: Vec2::new(center.x, center.y),
                    radius: ball.radius,
                });
            } else if let Some(polygon) = collider.shape().as_convex_polygon() {
                let vertices = polygon
                    .points()
                    .iter()
                    .map(|p| {
                        let world = collider.position().transform_point(p);
                        Vec2::new(world.x, world.y)
                    })
                    .collect();
                shapes.push(WorldShape::Polygon { vertices });
            }
        }
        shapes
    }

    /// Number of bodies in the world.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Check that every body pose is finite.
    ///
    /// # Errors
    ///
    /// Returns a fatal `NonFiniteValue` error naming the offending body.
    pub fn assert_finite(&self) -> SimResult<()> {
        for (handle, tag) in &self.tags {
            if let Some(rigid_body) = self.bodies.get(*handle) {
                let translation = rigid_body.translation();
                if !translation.x.is_finite() || !translation.y.is_finite() {
                    return Err(SimError::non_finite(format!(
                        "body {} position",
                        tag.object_id
                    )));
                }
                if !rigid_body.rotation().angle().is_finite() {
                    return Err(SimError::non_finite(format!("body {} angle", tag.object_id)));
                }
            }
        }
        Ok(())
    }
}

/// A collider shape resolved to world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldShape {
    /// Circle at an absolute center.
    Circle {
        /// Center in meters.
        center: Vec2,
        /// Radius in meters.
        radius: f32,
    },
    /// Polygon with absolute vertices.
    Polygon {
        /// Vertices in meters.
        vertices: Vec<Vec2>,
    },
}

// Wall body with one corner at the given position. Width and height may
// be negative.
fn build_static_box(x: f32, y: f32, width: f32, height: f32) -> Body {
    let position = Vec2::new(x + width / 2.0, y + height / 2.0);
    let mut vertices = Vec::with_capacity(4);
    for i in 0..4 {
        let on_right = i == 2 || i == 3;
        let on_top = i == 1 || i == 2;
        vertices.push(Vec2::new(
            (if on_right { 0.5 } else { -0.5 }) * width,
            (if on_top { 0.5 } else { -0.5 }) * height,
        ));
    }
    let mut body = build_polygon(position.x, position.y, vertices, 0.0, false);
    body.color = 0;
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scene::{build_box, build_circle};

    fn two_body_scene() -> Scene {
        let mut scene = Scene::new(64, 64);
        scene.bodies.push(build_box(0.0, 0.0, 4.0, 4.0, 0.0, false));
        scene.bodies.push(build_circle(10.0, 20.0, 2.0, true));
        scene
            .user_input_bodies
            .push(build_circle(30.0, 30.0, 1.0, true));
        scene
    }

    #[test]
    fn test_from_scene_tags_every_body() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene(&scene, &config).unwrap();
        assert_eq!(world.body_count(), 3);

        assert!(world.find_tagged_body(ObjectKind::General, 0).is_some());
        assert!(world.find_tagged_body(ObjectKind::General, 1).is_some());
        assert!(world.find_tagged_body(ObjectKind::User, 0).is_some());
        assert!(world.find_tagged_body(ObjectKind::General, 2).is_none());
        assert!(world.find_tagged_body(ObjectKind::BoundingBox, 0).is_none());
    }

    #[test]
    fn test_bounding_boxes_are_not_written_back() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene_with_bounding_boxes(&scene, &config).unwrap();
        assert_eq!(world.body_count(), 7);

        let updated = world.write_back_scene(&scene, &config.physics).unwrap();
        assert_eq!(updated.bodies.len(), scene.bodies.len());
        assert_eq!(updated.user_input_bodies.len(), scene.user_input_bodies.len());
    }

    #[test]
    fn test_write_back_round_trips_initial_pose() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene(&scene, &config).unwrap();
        let updated = world.write_back_scene(&scene, &config.physics).unwrap();

        for (before, after) in scene.bodies.iter().zip(updated.bodies.iter()) {
            assert!((before.position.x - after.position.x).abs() < 1e-3);
            assert!((before.position.y - after.position.y).abs() < 1e-3);
            assert!((before.angle - after.angle).abs() < 1e-5);
        }
    }

    #[test]
    fn test_dynamic_body_falls_under_gravity() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let mut world = TaggedWorld::from_scene(&scene, &config).unwrap();

        for _ in 0..30 {
            world.step();
        }
        world.assert_finite().unwrap();

        let updated = world.write_back_scene(&scene, &config.physics).unwrap();
        // The dynamic circle fell; the static box did not move.
        assert!(updated.bodies[1].position.y < scene.bodies[1].position.y);
        assert!((updated.bodies[0].position.y - scene.bodies[0].position.y).abs() < 1e-3);
    }

    #[test]
    fn test_circle_radius_lookup() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene(&scene, &config).unwrap();

        let circle = world.find_tagged_body(ObjectKind::General, 1).unwrap();
        let radius = world.circle_radius(circle).unwrap();
        assert!((radius - config.physics.p2m(2.0)).abs() < 1e-5);

        let box_body = world.find_tagged_body(ObjectKind::General, 0).unwrap();
        assert!(world.circle_radius(box_body).is_none());
    }

    #[test]
    fn test_body_aabb_of_box() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene(&scene, &config).unwrap();

        let box_body = world.find_tagged_body(ObjectKind::General, 0).unwrap();
        let aabb = world.body_aabb(box_body).unwrap();
        let side = config.physics.p2m(4.0);
        assert!((aabb.upper.x - aabb.lower.x - side).abs() < 1e-3);
        assert!((aabb.upper.y - aabb.lower.y - side).abs() < 1e-3);
    }

    #[test]
    fn test_tag_of_round_trips_identity() {
        let scene = two_body_scene();
        let config = SimConfig::default();
        let world = TaggedWorld::from_scene(&scene, &config).unwrap();

        let handle = world.find_tagged_body(ObjectKind::User, 0).unwrap();
        let tag = world.tag_of(handle).unwrap();
        assert_eq!(tag.kind, ObjectKind::User);
        assert_eq!(tag.object_id, 0);
    }

    #[test]
    fn test_degenerate_polygon_is_config_error() {
        let mut scene = Scene::new(16, 16);
        scene.bodies.push(build_polygon(
            0.0,
            0.0,
            vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
            0.0,
            false,
        ));
        let config = SimConfig::default();
        let result = TaggedWorld::from_scene(&scene, &config);
        assert!(matches!(result, Err(SimError::Config { .. })));
    }
}
