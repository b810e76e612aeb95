//! Simulation driver: fixed stepping, stride sampling, and solved-state
//! tracking.
//!
//! For how many steps the goal must hold varies by relationship. For the
//! NOT_TOUCHING relation one of three must be true:
//!   1. The bodies touch at the beginning and then stay apart for the
//!      solved-duration threshold.
//!   2. The bodies start apart, touch at some point of the simulation,
//!      and then stay apart for the threshold.
//!   3. The bodies stay apart for the whole simulation.
//! For TOUCHING_BRIEFLY a single touching step is enough. For every other
//! relation the goal must hold for the threshold's worth of consecutive
//! steps.

use crate::config::SimConfig;
use crate::engine::clock::StepClock;
use crate::engine::validator::is_task_solved;
use crate::engine::world::TaggedWorld;
use crate::error::SimResult;
use crate::scene::task::{SpatialRelationship, Task, TaskSimulation};
use crate::scene::Scene;

/// Stepping and sampling parameters for one simulation call.
#[derive(Debug, Clone, Copy)]
struct SimulationRequest {
    /// Maximum number of engine steps.
    max_steps: usize,
    /// Sampling interval; a value of zero or less disables scene
    /// sampling.
    stride: i32,
}

/// Deterministic task simulator.
///
/// Wraps a `SimConfig`; every simulation call creates a fresh physics
/// world and discards it at the end, so a `Simulator` is cheap to share
/// and reuse.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimConfig,
}

impl Simulator {
    /// Create a simulator with the given configuration.
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Get the simulator's configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run raw physics for `max_steps` and return every resulting scene.
    ///
    /// No goal tracking is performed.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid shapes or a non-finite world state.
    pub fn simulate_scene(&self, scene: &Scene, max_steps: usize) -> SimResult<Vec<Scene>> {
        let request = SimulationRequest {
            max_steps,
            stride: 1,
        };
        Ok(self.run(scene, None, request)?.scene_list)
    }

    /// Simulate a task for at most `max_steps`, stopping early once the
    /// goal is durably satisfied.
    ///
    /// Scenes and solved flags are sampled at stride boundaries (steps 0,
    /// stride, 2*stride, ...). Note that for a big enough stride there is
    /// no guarantee the last scene is in the solved state.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid task configuration, invalid shapes, or
    /// a non-finite world state.
    pub fn simulate_task(
        &self,
        task: &Task,
        max_steps: usize,
        stride: i32,
    ) -> SimResult<TaskSimulation> {
        let request = SimulationRequest { max_steps, stride };
        self.run(&task.scene, Some(task), request)
    }

    fn run(
        &self,
        scene: &Scene,
        task: Option<&Task>,
        request: SimulationRequest,
    ) -> SimResult<TaskSimulation> {
        let mut world = TaggedWorld::from_scene(scene, &self.config)?;
        let mut clock = StepClock::with_limit(self.config.timestep(), request.max_steps);

        let mut continuous_solved_count: usize = 0;
        let mut scenes: Vec<Scene> = Vec::new();
        let mut solve_state_list: Vec<bool> = Vec::new();
        let mut solved = false;

        // A run that starts in the solved state with a sole NOT_TOUCHING
        // relationship is not "looking" yet: it must either hold for the
        // whole run (case 3) or pass through a non-solved state first.
        let mut looking_for_solution = match task {
            Some(task) => {
                !(is_task_solved(task, &world, &self.config)?
                    && task.relationships.len() == 1
                    && task.relationships[0] == SpatialRelationship::NotTouching)
            }
            None => true,
        };
        let allow_instant_solution = task.is_some_and(|t| {
            t.relationships.len() == 1
                && t.relationships[0] == SpatialRelationship::TouchingBriefly
        });

        while !clock.at_limit() {
            // 0-based index of the step being executed.
            let step = clock.step_count();
            world.step();
            world.assert_finite()?;

            if request.stride > 0 && step % (request.stride as usize) == 0 {
                scenes.push(world.write_back_scene(scene, &self.config.physics)?);
            }

            if let Some(task) = task {
                let now_solved = is_task_solved(task, &world, &self.config)?;
                solve_state_list.push(now_solved);
                if now_solved {
                    continuous_solved_count += 1;
                    if looking_for_solution
                        && (continuous_solved_count >= self.config.goal.solved_duration_steps
                            || allow_instant_solution)
                    {
                        solved = true;
                        break;
                    }
                } else {
                    // Task passed through a non-solved state.
                    looking_for_solution = true;
                    continuous_solved_count = 0;
                }
            } else {
                solve_state_list.push(false);
            }

            clock.tick();
        }

        if !looking_for_solution && continuous_solved_count == solve_state_list.len() {
            // NOT_TOUCHING case 3: the goal held for every simulated step.
            solved = true;
        }

        let mut simulation = TaskSimulation {
            scene_list: scenes,
            steps_simulated: clock.step_count(),
            ..TaskSimulation::default()
        };
        if task.is_some() {
            if request.stride > 0 {
                simulation.solved_state_list = solve_state_list
                    .iter()
                    .step_by(request.stride as usize)
                    .copied()
                    .collect();
            }
            simulation.is_solution = solved;
        }

        Ok(simulation)
    }
}

/// Run raw physics for `max_steps` with the default configuration.
///
/// # Errors
///
/// Returns an error on invalid shapes or a non-finite world state.
pub fn simulate_scene(scene: &Scene, max_steps: usize) -> SimResult<Vec<Scene>> {
    Simulator::default().simulate_scene(scene, max_steps)
}

/// Simulate a task with the default configuration.
///
/// # Errors
///
/// Returns an error on invalid task configuration, invalid shapes, or a
/// non-finite world state.
pub fn simulate_task(task: &Task, max_steps: usize, stride: i32) -> SimResult<TaskSimulation> {
    Simulator::default().simulate_task(task, max_steps, stride)
}
