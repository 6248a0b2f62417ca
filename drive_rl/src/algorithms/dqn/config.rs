//! DQN hyperparameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::scheduling::ExplorationSchedule;

/// Configuration for DQN training.
///
/// Set once before training starts and never mutated afterwards. The defaults
/// are tuned for 84x84 grayscale camera driving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    // ========================================================================
    // Optimization
    // ========================================================================
    /// Adam learning rate.
    pub learning_rate: f64,

    /// Adam epsilon.
    pub adam_epsilon: f32,

    /// Transitions per gradient update.
    pub batch_size: usize,

    /// Gradient-norm clamp applied before every optimizer step.
    pub max_grad_norm: f32,

    /// Discount factor for future rewards.
    pub gamma: f64,

    // ========================================================================
    // Update cadence (measured in host steps unless noted)
    // ========================================================================
    /// Host steps between updates.
    pub train_freq: usize,

    /// Gradient updates per training round.
    pub gradient_steps: usize,

    /// Environment steps between target network syncs.
    pub target_update_interval: usize,

    /// Environment steps collected before updates start. Actions are uniformly
    /// random until then.
    pub learning_starts: u64,

    // ========================================================================
    // Replay & exploration
    // ========================================================================
    /// Replay buffer capacity.
    pub buffer_size: usize,

    /// Share of the step budget over which epsilon decays.
    pub exploration_fraction: f64,

    pub exploration_initial_eps: f64,

    pub exploration_final_eps: f64,

    // ========================================================================
    // Network
    // ========================================================================
    /// Width of the feature layer after the convolutional stack.
    pub features_dim: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 2.5e-4,
            adam_epsilon: 1e-8,
            batch_size: 32,
            max_grad_norm: 10.0,
            gamma: 0.99,
            train_freq: 4,
            gradient_steps: 1,
            target_update_interval: 10_000,
            learning_starts: 10_000,
            buffer_size: 50_000,
            exploration_fraction: 0.1,
            exploration_initial_eps: 1.0,
            exploration_final_eps: 0.01,
            features_dim: 512,
        }
    }
}

impl DqnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_train_freq(mut self, train_freq: usize) -> Self {
        self.train_freq = train_freq;
        self
    }

    pub fn with_gradient_steps(mut self, gradient_steps: usize) -> Self {
        self.gradient_steps = gradient_steps;
        self
    }

    pub fn with_target_update_interval(mut self, interval: usize) -> Self {
        self.target_update_interval = interval;
        self
    }

    pub fn with_learning_starts(mut self, learning_starts: u64) -> Self {
        self.learning_starts = learning_starts;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_max_grad_norm(mut self, max_grad_norm: f32) -> Self {
        self.max_grad_norm = max_grad_norm;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the whole exploration schedule.
    pub fn with_exploration(mut self, schedule: ExplorationSchedule) -> Self {
        self.exploration_initial_eps = schedule.initial;
        self.exploration_final_eps = schedule.final_eps;
        self.exploration_fraction = schedule.fraction;
        self
    }

    pub fn with_features_dim(mut self, features_dim: usize) -> Self {
        self.features_dim = features_dim;
        self
    }

    pub fn exploration(&self) -> ExplorationSchedule {
        ExplorationSchedule::new(
            self.exploration_initial_eps,
            self.exploration_final_eps,
            self.exploration_fraction,
        )
    }

    /// Check every hyperparameter against the step budget.
    ///
    /// Runs before any environment interaction.
    pub fn validate(&self, total_timesteps: i64) -> Result<(), ConfigError> {
        if total_timesteps <= 0 {
            return Err(ConfigError::NonPositiveStepBudget(total_timesteps));
        }
        self.validate_hyperparameters()
    }

    /// Everything [`validate`](Self::validate) checks except the step budget.
    pub fn validate_hyperparameters(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("buffer_size", self.buffer_size),
            ("train_freq", self.train_freq),
            ("gradient_steps", self.gradient_steps),
            ("target_update_interval", self.target_update_interval),
            ("features_dim", self.features_dim),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        if self.buffer_size < self.batch_size {
            return Err(ConfigError::BufferSmallerThanBatch {
                buffer_size: self.buffer_size,
                batch_size: self.batch_size,
            });
        }
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("max_grad_norm", self.max_grad_norm as f64),
            ("adam_epsilon", self.adam_epsilon as f64),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfUnitRange {
                name: "gamma",
                value: self.gamma,
            });
        }
        self.exploration().validate()
    }
}
