//! Simulation engine: the physics adapter, the goal validator, and the
//! stepping driver.
//!
//! The rigid-body dynamics themselves live in an external engine
//! (`rapier2d`) treated as a black box with a fixed-timestep step
//! contract. This module owns everything around it:
//! - `world`: Scene to physics-world conversion with stable body tagging
//! - `validator`: the goal-predicate evaluator
//! - `clock`: fixed-timestep step accounting
//! - `driver`: the stepping/sampling loop and solved-state tracking

pub mod clock;
pub mod driver;
pub mod validator;
pub mod world;

pub use clock::StepClock;
pub use driver::{simulate_scene, simulate_task, Simulator};
pub use validator::is_task_solved;
pub use world::{BodyTag, ObjectKind, TaggedWorld};
