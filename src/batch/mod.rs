//! Data-parallel batch execution of independent tasks.
//!
//! Two strategies, one contract: for any task list and worker count the
//! output must equal element-wise sequential simulation.
//!
//! - **Thread mode** partitions tasks round-robin across scoped worker
//!   threads. Each worker owns its own physics worlds, so no locking is
//!   needed beyond one pre-allocated result slot per task, written by
//!   exactly one worker.
//! - **Record mode** additionally funnels every sampled scene through a
//!   fixed-capacity byte segment sized before any worker starts. The
//!   segment size derives from the encoded size of one scene, which is
//!   stable across a run because bodies are never added or removed
//!   mid-simulation; a worker observing a different size aborts the
//!   whole batch.
//!
//! A failed worker is fatal to the entire batch call, not just its own
//! tasks, with a distinct error per failure class.

use std::sync::{Mutex, PoisonError};

use crate::config::SimConfig;
use crate::engine::driver::Simulator;
use crate::error::{SimError, SimResult};
use crate::scene::task::{Task, TaskSimulation};
use crate::scene::Scene;

/// Batch executor over a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    config: SimConfig,
}

impl BatchExecutor {
    /// Create an executor with the given configuration.
    #[must_use]
    pub const fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Simulate every task on the calling thread, in order.
    ///
    /// This is the baseline the parallel modes are checked against.
    ///
    /// # Errors
    ///
    /// Returns the first simulation error.
    pub fn run_sequential(
        &self,
        tasks: &[Task],
        max_steps: usize,
        stride: i32,
    ) -> SimResult<Vec<TaskSimulation>> {
        let simulator = Simulator::new(self.config.clone());
        tasks
            .iter()
            .map(|task| simulator.simulate_task(task, max_steps, stride))
            .collect()
    }

    /// Simulate tasks across `workers` threads.
    ///
    /// Tasks are partitioned round-robin; worker `w` simulates tasks
    /// `w, w + workers, w + 2*workers, ...`. Worker counts of zero or one
    /// fall back to sequential execution.
    ///
    /// # Errors
    ///
    /// Returns the first simulation error, or `WorkerPanicked` if a
    /// worker thread died.
    pub fn run_threaded(
        &self,
        tasks: &[Task],
        workers: usize,
        max_steps: usize,
        stride: i32,
    ) -> SimResult<Vec<TaskSimulation>> {
        if workers <= 1 {
            return self.run_sequential(tasks, max_steps, stride);
        }
        log::debug!(
            "simulating {} tasks across {} worker threads",
            tasks.len(),
            workers
        );

        let slots: Vec<Mutex<Option<SimResult<TaskSimulation>>>> =
            tasks.iter().map(|_| Mutex::new(None)).collect();

        let panicked = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker_id| {
                    let slots = &slots;
                    let config = &self.config;
                    scope.spawn(move || {
                        let simulator = Simulator::new(config.clone());
                        for task_id in (worker_id..tasks.len()).step_by(workers) {
                            let result =
                                simulator.simulate_task(&tasks[task_id], max_steps, stride);
                            if let Ok(mut slot) = slots[task_id].lock() {
                                *slot = Some(result);
                            }
                        }
                    })
                })
                .collect();

            let mut panicked = None;
            for (worker_id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(worker_id);
                }
            }
            panicked
        });

        if let Some(worker) = panicked {
            return Err(SimError::WorkerPanicked { worker });
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (task_id, slot) in slots.into_iter().enumerate() {
            let inner = slot.into_inner().unwrap_or_else(PoisonError::into_inner);
            match inner {
                Some(result) => results.push(result?),
                None => {
                    return Err(SimError::WorkerPanicked {
                        worker: task_id % workers,
                    })
                }
            }
        }
        Ok(results)
    }

    /// Simulate tasks across `workers` threads, routing every sampled
    /// scene through pre-sized record segments.
    ///
    /// Mirrors the shared-memory execution model: segment sizes are
    /// computed from the initial scenes before any worker starts, and a
    /// serialized-size drift mid-run aborts the batch with
    /// `RecordSizeMismatch`.
    ///
    /// # Errors
    ///
    /// Returns the first worker error; the whole batch fails together.
    pub fn run_with_records(
        &self,
        tasks: &[Task],
        workers: usize,
        max_steps: usize,
        stride: i32,
    ) -> SimResult<Vec<TaskSimulation>> {
        let segments: Vec<Mutex<RecordSegment>> = tasks
            .iter()
            .map(|task| RecordSegment::for_task(task, max_steps).map(Mutex::new))
            .collect::<SimResult<Vec<_>>>()?;
        let worker_count = workers.max(1);
        log::debug!(
            "simulating {} tasks across {} record-mode workers",
            tasks.len(),
            worker_count
        );

        let outcomes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..worker_count)
                .map(|worker_id| {
                    let segments = &segments;
                    let config = &self.config;
                    scope.spawn(move || -> SimResult<()> {
                        let simulator = Simulator::new(config.clone());
                        for task_id in (worker_id..tasks.len()).step_by(worker_count) {
                            let simulation =
                                simulator.simulate_task(&tasks[task_id], max_steps, stride)?;
                            let mut segment = segments[task_id]
                                .lock()
                                .map_err(|_| SimError::WorkerPanicked { worker: worker_id })?;
                            segment.store(&simulation)?;
                        }
                        Ok(())
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(worker_count);
            for (worker_id, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(result) => outcomes.push(result),
                    Err(_) => outcomes.push(Err(SimError::WorkerPanicked { worker: worker_id })),
                }
            }
            outcomes
        });

        for outcome in outcomes {
            outcome?;
        }

        segments
            .into_iter()
            .map(|segment| {
                segment
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .decode()
            })
            .collect()
    }
}

/// Fixed-capacity record for one task's simulation output.
///
/// Layout: `scene_size` bytes per sampled scene plus one solved byte per
/// sample, for up to `capacity` samples, plus the summary fields
/// (`is_solution`, sample count, steps simulated).
#[derive(Debug)]
pub struct RecordSegment {
    scene_size: usize,
    capacity: usize,
    scenes: Vec<u8>,
    solved: Vec<u8>,
    num_samples: usize,
    is_solution: bool,
    steps_simulated: usize,
}

impl RecordSegment {
    /// Size a segment for one task: the encoded size of its initial
    /// scene times the step budget.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the scene cannot be encoded.
    pub fn for_task(task: &Task, max_steps: usize) -> SimResult<Self> {
        let scene_size = bincode::serialized_size(&task.scene)
            .map_err(|e| SimError::serialization(e.to_string()))? as usize;
        Ok(Self {
            scene_size,
            capacity: max_steps,
            scenes: vec![0; scene_size * max_steps],
            solved: vec![0; max_steps],
            num_samples: 0,
            is_solution: false,
            steps_simulated: 0,
        })
    }

    /// Encoded size of one scene in this segment.
    #[must_use]
    pub const fn scene_size(&self) -> usize {
        self.scene_size
    }

    /// Serialize a finished simulation into the segment.
    ///
    /// # Errors
    ///
    /// - `RecordOverflow` if the simulation has more samples than the
    ///   segment was sized for.
    /// - `RecordSizeMismatch` if any sampled scene encodes to a size
    ///   other than the precomputed one.
    pub fn store(&mut self, simulation: &TaskSimulation) -> SimResult<()> {
        if simulation.scene_list.len() > self.capacity {
            return Err(SimError::RecordOverflow {
                sample: simulation.scene_list.len(),
                capacity: self.capacity,
            });
        }
        for (i, scene) in simulation.scene_list.iter().enumerate() {
            let bytes = bincode::serialize(scene)
                .map_err(|e| SimError::serialization(e.to_string()))?;
            if bytes.len() != self.scene_size {
                return Err(SimError::RecordSizeMismatch {
                    expected: self.scene_size,
                    actual: bytes.len(),
                });
            }
            let start = i * self.scene_size;
            self.scenes[start..start + self.scene_size].copy_from_slice(&bytes);
        }
        for (i, &flag) in simulation.solved_state_list.iter().enumerate() {
            self.solved[i] = u8::from(flag);
        }
        self.num_samples = simulation.scene_list.len();
        self.is_solution = simulation.is_solution;
        self.steps_simulated = simulation.steps_simulated;
        Ok(())
    }

    /// Decode the segment back into a `TaskSimulation`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a stored scene cannot be decoded.
    pub fn decode(&self) -> SimResult<TaskSimulation> {
        let mut scene_list = Vec::with_capacity(self.num_samples);
        for i in 0..self.num_samples {
            let start = i * self.scene_size;
            let scene: Scene = bincode::deserialize(&self.scenes[start..start + self.scene_size])
                .map_err(|e| SimError::serialization(e.to_string()))?;
            scene_list.push(scene);
        }
        let solved_state_list = self.solved[..self.num_samples]
            .iter()
            .map(|&b| b != 0)
            .collect();
        Ok(TaskSimulation {
            scene_list,
            solved_state_list,
            is_solution: self.is_solution,
            steps_simulated: self.steps_simulated,
        })
    }
}

/// Simulate tasks in parallel with the default configuration.
///
/// A worker count of zero or one runs sequentially.
///
/// # Errors
///
/// Returns the first simulation or worker error; the whole batch fails
/// together.
pub fn simulate_tasks_in_parallel(
    tasks: &[Task],
    workers: usize,
    max_steps: usize,
    stride: i32,
) -> SimResult<Vec<TaskSimulation>> {
    BatchExecutor::default().run_threaded(tasks, workers, max_steps, stride)
}
