//! Fixed-timestep step accounting.

use serde::{Deserialize, Serialize};

/// Step clock for a fixed-timestep simulation.
///
/// Tracks how many engine steps have been executed and how much simulated
/// time that represents. Stepping is strictly fixed-dt; there is no
/// adaptive mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepClock {
    /// Timestep duration in seconds.
    timestep: f32,
    /// Number of steps taken.
    step_count: usize,
    /// Maximum number of steps (optional limit).
    max_steps: Option<usize>,
}

impl StepClock {
    /// Create a new clock with the given timestep in seconds.
    ///
    /// # Panics
    ///
    /// Panics if timestep is not positive or not finite.
    #[must_use]
    pub fn new(timestep: f32) -> Self {
        assert!(timestep > 0.0, "Timestep must be positive");
        assert!(timestep.is_finite(), "Timestep must be finite");
        Self {
            timestep,
            step_count: 0,
            max_steps: None,
        }
    }

    /// Create a clock with a step limit.
    #[must_use]
    pub fn with_limit(timestep: f32, max_steps: usize) -> Self {
        let mut clock = Self::new(timestep);
        clock.max_steps = Some(max_steps);
        clock
    }

    /// Get the timestep in seconds.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.timestep
    }

    /// Get the number of steps taken.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.step_count
    }

    /// Get the simulated time in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f32 {
        self.step_count as f32 * self.timestep
    }

    /// Check if the step limit has been reached.
    #[must_use]
    pub fn at_limit(&self) -> bool {
        self.max_steps.is_some_and(|max| self.step_count >= max)
    }

    /// Advance the clock by one step. Returns the new step count.
    pub fn tick(&mut self) -> usize {
        self.step_count += 1;
        self.step_count
    }

    /// Reset the clock to step zero.
    pub fn reset(&mut self) {
        self.step_count = 0;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: step count equals number of ticks.
        #[test]
        fn prop_step_count_accurate(timestep in 0.0001f32..1.0, ticks in 0usize..1000) {
            let mut clock = StepClock::new(timestep);
            for _ in 0..ticks {
                clock.tick();
            }
            prop_assert_eq!(clock.step_count(), ticks);
        }

        /// Falsification: elapsed time is steps times dt.
        #[test]
        fn prop_elapsed_matches(timestep in 0.001f32..0.1, ticks in 1usize..500) {
            let mut clock = StepClock::new(timestep);
            for _ in 0..ticks {
                clock.tick();
            }
            let expected = timestep * ticks as f32;
            prop_assert!((clock.elapsed_secs() - expected).abs() < 1e-3 * expected.max(1.0));
        }
    }
}
