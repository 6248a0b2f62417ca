//! Run-level settings: step budget, evaluation cadence, paths and seeding.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluation::EvalConfig;

/// Configuration of one training run.
///
/// Algorithm hyperparameters live in [`DqnConfig`](crate::algorithms::DqnConfig).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Environment steps to train for. Signed so that a negative budget read
    /// from a config file is reported rather than wrapped.
    pub total_timesteps: i64,

    /// Number of environments in the host.
    pub n_envs: usize,

    // ========================================================================
    // Evaluation
    // ========================================================================
    /// Host steps between evaluation passes.
    pub eval_freq: u64,
    pub n_eval_episodes: usize,
    pub max_consecutive_failures: usize,
    /// Directory of the best-model slot. `None` disables persistence.
    pub best_model_dir: Option<PathBuf>,

    // ========================================================================
    // Output
    // ========================================================================
    /// Where the final policy is written.
    pub policy_path: PathBuf,
    /// Parent of the per-run metrics directory.
    pub log_dir: PathBuf,
    pub run_name: String,
    /// Finished training episodes between progress reports.
    pub log_interval: usize,

    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            total_timesteps: 500_000,
            n_envs: 1,
            eval_freq: 10_000,
            n_eval_episodes: 5,
            max_consecutive_failures: 3,
            best_model_dir: Some(PathBuf::from("logs")),
            policy_path: PathBuf::from("dqn_drive_policy"),
            log_dir: PathBuf::from("logs"),
            run_name: "DQN".to_string(),
            log_interval: 4,
            seed: None,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total_timesteps(mut self, total: i64) -> Self {
        self.total_timesteps = total;
        self
    }

    pub fn with_n_envs(mut self, n_envs: usize) -> Self {
        self.n_envs = n_envs;
        self
    }

    pub fn with_eval_freq(mut self, eval_freq: u64) -> Self {
        self.eval_freq = eval_freq;
        self
    }

    pub fn with_n_eval_episodes(mut self, n: usize) -> Self {
        self.n_eval_episodes = n;
        self
    }

    pub fn with_max_consecutive_failures(mut self, n: usize) -> Self {
        self.max_consecutive_failures = n;
        self
    }

    pub fn with_best_model_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.best_model_dir = dir;
        self
    }

    pub fn with_policy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.policy_path = path.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = name.into();
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Settings for the evaluation scheduler.
    pub fn eval_config(&self) -> EvalConfig {
        EvalConfig::new(self.eval_freq, self.n_eval_episodes)
            .with_max_consecutive_failures(self.max_consecutive_failures)
    }

    /// Per-run metrics directory name: `<run_name>_<unix_seconds>`.
    pub fn run_dir(&self, unix_seconds: u64) -> PathBuf {
        self.log_dir.join(format!("{}_{}", self.run_name, unix_seconds))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_timesteps <= 0 {
            return Err(ConfigError::NonPositiveStepBudget(self.total_timesteps));
        }
        if self.n_envs == 0 {
            return Err(ConfigError::Zero("n_envs"));
        }
        if self.log_interval == 0 {
            return Err(ConfigError::Zero("log_interval"));
        }
        self.eval_config().validate()
    }
}
