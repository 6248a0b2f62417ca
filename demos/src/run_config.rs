//! YAML run configuration.
//!
//! Every section is optional; missing fields take their defaults.
//!
//! ```yaml
//! train:
//!   total_timesteps: 200000
//!   n_envs: 2
//!   seed: 7
//! dqn:
//!   learning_rate: 0.0001
//!   buffer_size: 20000
//! env:
//!   max_steps: 600
//!   road:
//!     amplitude: 4.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use drive_rl::{DqnConfig, TrainConfig};
use lane_keeping::LaneKeepingConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub train: TrainConfig,
    pub dqn: DqnConfig,
    pub env: LaneKeepingConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = serde_yaml::to_string(self)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Check all sections before anything touches an environment.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.train.validate()?;
        self.dqn.validate(self.train.total_timesteps)?;
        self.env.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(
            &path,
            "train:\n  total_timesteps: 1000\ndqn:\n  batch_size: 64\nenv:\n  max_steps: 50\n",
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.train.total_timesteps, 1_000);
        assert_eq!(config.train.eval_freq, 10_000);
        assert_eq!(config.dqn.batch_size, 64);
        assert_eq!(config.dqn.buffer_size, 50_000);
        assert_eq!(config.env.max_steps, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = RunConfig::default();
        config.train.seed = Some(3);
        config.save(&path).unwrap();
        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = RunConfig::default();
        config.train.total_timesteps = 0;
        assert!(config.validate().is_err());
    }
}
