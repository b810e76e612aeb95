//! Configuration system with YAML schema and validation.
//!
//! Mistake-proofing through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation
//!
//! Every empirically tuned constant of the simulation lives here rather
//! than inline in the code: physics material constants, solver iteration
//! counts, the solved-duration threshold, the pixel/meter scale, and the
//! geometric tolerance epsilons.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Physics material constants.
    #[validate(nested)]
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Solver stepping parameters.
    #[validate(nested)]
    #[serde(default)]
    pub solver: SolverConfig,

    /// Goal-evaluation parameters.
    #[validate(nested)]
    #[serde(default)]
    pub goal: GoalConfig,

    /// Geometric tolerance epsilons.
    #[serde(default)]
    pub tolerances: Tolerances,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;

        // Schema constraints first, then semantic constraints.
        config.validate()?;
        config.validate_semantic()?;

        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        let dt = self.solver.timestep;
        if dt <= 0.0 {
            return Err(SimError::config("Timestep must be positive"));
        }
        if dt > 1.0 {
            return Err(SimError::config("Timestep should not exceed 1 second"));
        }

        if self.physics.pixels_per_meter <= 0.0 {
            return Err(SimError::config("Pixel/meter scale must be positive"));
        }

        if self.goal.solved_duration_steps == 0 {
            return Err(SimError::config(
                "Solved-duration threshold must be at least one step",
            ));
        }

        Ok(())
    }

    /// Get the fixed timestep in seconds.
    #[must_use]
    pub const fn timestep(&self) -> f32 {
        self.solver.timestep
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            physics: PhysicsConfig::default(),
            solver: SolverConfig::default(),
            goal: GoalConfig::default(),
            tolerances: Tolerances::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    timestep: Option<f32>,
    solved_duration_steps: Option<usize>,
    max_steps: Option<usize>,
}

impl SimConfigBuilder {
    /// Set the fixed timestep in seconds.
    #[must_use]
    pub const fn timestep(mut self, dt: f32) -> Self {
        self.timestep = Some(dt);
        self
    }

    /// Set the solved-duration threshold in steps.
    #[must_use]
    pub const fn solved_duration_steps(mut self, steps: usize) -> Self {
        self.solved_duration_steps = Some(steps);
        self
    }

    /// Set the default maximum step count.
    #[must_use]
    pub const fn max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(dt) = self.timestep {
            config.solver.timestep = dt;
        }
        if let Some(steps) = self.solved_duration_steps {
            config.goal.solved_duration_steps = steps;
        }
        if let Some(steps) = self.max_steps {
            config.goal.default_max_steps = steps;
        }

        config
    }
}

/// Physics material constants, applied uniformly to every body.
///
/// Defaults reproduce the benchmark's canonical world: pixel-space scenes
/// scaled to meters at 6 px/m, single downward gravity vector, non-zero
/// density only on dynamic bodies.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhysicsConfig {
    /// Gravity along the y axis, meters per second squared.
    pub gravity_y: f32,
    /// Fixture density for dynamic bodies. Static bodies get zero density.
    #[validate(range(min = 0.0))]
    pub density: f32,
    /// Friction coefficient, usually in [0, 1].
    #[validate(range(min = 0.0))]
    pub friction: f32,
    /// Restitution (bounciness) in [0, 1].
    #[validate(range(min = 0.0, max = 1.0))]
    pub restitution: f32,
    /// Angular velocity damping.
    #[validate(range(min = 0.0))]
    pub angular_damping: f32,
    /// Linear velocity damping.
    #[validate(range(min = 0.0))]
    pub linear_damping: f32,
    /// Scene pixels per world meter.
    pub pixels_per_meter: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_y: -9.8,
            density: 0.25,
            friction: 0.5,
            restitution: 0.2,
            angular_damping: 0.01,
            linear_damping: 0.0,
            pixels_per_meter: 6.0,
        }
    }
}

impl PhysicsConfig {
    /// Convert pixels to meters.
    #[must_use]
    pub fn p2m(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }

    /// Convert meters to pixels.
    #[must_use]
    pub fn m2p(&self, meters: f32) -> f32 {
        meters * self.pixels_per_meter
    }
}

/// Solver stepping parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SolverConfig {
    /// Fixed timestep in seconds (1/60 s).
    pub timestep: f32,
    /// Velocity solver iterations per step.
    #[validate(range(min = 1))]
    pub velocity_iterations: usize,
    /// Position solver iterations per step.
    #[validate(range(min = 1))]
    pub position_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 60.0,
            velocity_iterations: 15,
            position_iterations: 20,
        }
    }
}

/// Goal-evaluation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoalConfig {
    /// Consecutive solved steps required for a durable solution
    /// (3 seconds at 60 fps).
    #[validate(range(min = 1))]
    pub solved_duration_steps: usize,
    /// Default maximum number of simulation steps.
    #[validate(range(min = 1))]
    pub default_max_steps: usize,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            solved_duration_steps: 180,
            default_max_steps: 1000,
        }
    }
}

/// Geometric tolerance epsilons, in pixel units unless noted.
///
/// The conservative bias is deliberate: touching counts as occlusion and
/// as insideness. Values are empirical; callers that need different
/// tolerance bands override them here instead of patching the kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tolerances {
    /// Edges shorter than this (squared length) are treated as points.
    pub zero_length_edge: f32,
    /// Slack absorbed by insideness/occlusion predicates.
    pub insideness: f32,
    /// Distance slack for the two-ball touching fast path, in pixels.
    pub ball_touching_px: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            zero_length_edge: 1e-4,
            insideness: 1e-5,
            ball_touching_px: 0.1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_semantic().is_ok());
    }

    #[test]
    fn test_default_constants() {
        let config = SimConfig::default();
        assert!((config.timestep() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(config.solver.velocity_iterations, 15);
        assert_eq!(config.solver.position_iterations, 20);
        assert_eq!(config.goal.solved_duration_steps, 180);
        assert_eq!(config.goal.default_max_steps, 1000);
        assert!((config.physics.pixels_per_meter - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_builder() {
        let config = SimConfig::builder()
            .timestep(0.01)
            .solved_duration_steps(30)
            .max_steps(500)
            .build();
        assert!((config.timestep() - 0.01).abs() < f32::EPSILON);
        assert_eq!(config.goal.solved_duration_steps, 30);
        assert_eq!(config.goal.default_max_steps, 500);
    }

    #[test]
    fn test_pixel_meter_round_trip() {
        let physics = PhysicsConfig::default();
        let pixels = 42.0;
        assert!((physics.m2p(physics.p2m(pixels)) - pixels).abs() < 1e-4);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = SimConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = SimConfig::from_yaml(&yaml).unwrap();
        assert!((parsed.timestep() - config.timestep()).abs() < f32::EPSILON);
        assert_eq!(
            parsed.goal.solved_duration_steps,
            config.goal.solved_duration_steps
        );
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        let yaml = "schema_version: '1.0'\nbogus_field: 1\n";
        assert!(SimConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_semantic_rejects_bad_timestep() {
        let mut config = SimConfig::default();
        config.solver.timestep = 0.0;
        assert!(config.validate_semantic().is_err());

        config.solver.timestep = 2.0;
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_semantic_rejects_zero_duration() {
        let mut config = SimConfig::default();
        config.goal.solved_duration_steps = 0;
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_tolerances_defaults() {
        let tol = Tolerances::default();
        assert!(tol.zero_length_edge > 0.0);
        assert!(tol.insideness > 0.0);
        assert!((tol.ball_touching_px - 0.1).abs() < f32::EPSILON);
    }
}
