//! # goalsim
//!
//! Deterministic evaluation kernel for a 2D physical-reasoning
//! benchmark: simulate rigid-body scenarios ("tasks"), decide whether a
//! goal predicate holds at each step, and return a compact trajectory
//! usable for scoring, caching, and visualization.
//!
//! Rigid-body dynamics are delegated to an external engine behind
//! [`engine::world::TaggedWorld`]; this crate owns scene setup, goal
//! evaluation, temporal aggregation, batch fan-out, rasterization, and
//! user-input merging.
//!
//! ## Example
//!
//! ```rust
//! use goalsim::prelude::*;
//! use goalsim::scene::{build_box, build_circle, Scene};
//! use goalsim::scene::task::{SpatialRelationship, Task};
//!
//! let mut scene = Scene::new(64, 64);
//! scene.bodies.push(build_box(0.0, 0.0, 40.0, 2.0, 0.0, false));
//! scene.bodies.push(build_circle(10.0, 30.0, 2.0, true));
//!
//! let task = Task {
//!     scene,
//!     body_id1: 1,
//!     body_id2: 0,
//!     relationships: vec![SpatialRelationship::TouchingBriefly],
//!     phantom_shape: None,
//!     tier: String::new(),
//! };
//! let simulation = simulate_task(&task, 1000, 1).unwrap();
//! assert!(simulation.is_solution);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::needless_range_loop,   // Index loops mirror the geometry formulas
    clippy::float_cmp,             // Bitwise equality is the determinism contract
    clippy::suboptimal_flops,      // Numerical code kept in textbook form
    clippy::field_reassign_with_default
)]

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod io;
pub mod render;
pub mod scene;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::batch::{simulate_tasks_in_parallel, BatchExecutor};
    pub use crate::config::{SimConfig, SimConfigBuilder};
    pub use crate::engine::{simulate_scene, simulate_task, Simulator};
    pub use crate::error::{SimError, SimResult};
    pub use crate::scene::task::{SpatialRelationship, Task, TaskSimulation};
    pub use crate::scene::{Body, Scene, Shape, UserInput};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
