//! Epsilon-greedy exploration schedule.
//!
//! The exploration probability decays linearly from `initial` to `final_eps`
//! over the first `fraction` of the step budget, then holds at `final_eps`:
//!
//! ```text
//! progress = step / total_steps
//! ε(step)  = initial + progress · (final_eps − initial) / fraction   if progress < fraction
//!          = final_eps                                               otherwise
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Linear decay of the exploration probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    pub initial: f64,
    pub final_eps: f64,
    /// Share of the step budget spent decaying.
    pub fraction: f64,
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self {
            initial: 1.0,
            final_eps: 0.01,
            fraction: 0.1,
        }
    }
}

impl ExplorationSchedule {
    pub fn new(initial: f64, final_eps: f64, fraction: f64) -> Self {
        Self {
            initial,
            final_eps,
            fraction,
        }
    }

    /// Check the probabilities and fraction lie in `[0, 1]` and that the rate
    /// does not increase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("exploration_initial_eps", self.initial),
            ("exploration_final_eps", self.final_eps),
            ("exploration_fraction", self.fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        if self.final_eps > self.initial {
            return Err(ConfigError::IncreasingExploration {
                initial_eps: self.initial,
                final_eps: self.final_eps,
            });
        }
        Ok(())
    }

    /// Exploration probability after `step` of `total_steps` environment steps.
    pub fn value(&self, step: u64, total_steps: u64) -> f64 {
        if total_steps == 0 || self.fraction <= 0.0 {
            return self.final_eps;
        }
        let progress = step as f64 / total_steps as f64;
        if progress >= self.fraction {
            self.final_eps
        } else {
            self.initial + progress * (self.final_eps - self.initial) / self.fraction
        }
    }

    /// Step at which the decay completes.
    pub fn decay_end(&self, total_steps: u64) -> u64 {
        (self.fraction * total_steps as f64).ceil() as u64
    }
}
