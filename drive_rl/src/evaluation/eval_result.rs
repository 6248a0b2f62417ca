//! Aggregated statistics of one evaluation pass.
//!
//! # Data Integrity
//!
//! `EvalResult::from_episodes()` filters non-finite returns so the logged
//! statistics stay meaningful; filtered episodes are counted separately.
//! [`EvalResult::score`] is the plain mean over every episode and is what
//! competes for the best checkpoint, so one diverging episode poisons it.

use serde::{Deserialize, Serialize};

/// Evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Environment step at which the pass ran.
    pub step: u64,

    /// Mean return (finite values only).
    pub mean_reward: f64,

    /// Population standard deviation of returns (finite values only).
    pub std_reward: f64,

    pub min_reward: f64,

    pub max_reward: f64,

    /// Mean episode length.
    pub mean_length: f64,

    /// Episodes evaluated, including filtered ones.
    pub n_episodes: usize,

    /// Episodes whose return was NaN or infinite.
    pub n_filtered_episodes: usize,

    /// Per-episode returns in completion order.
    pub episode_rewards: Vec<f64>,

    pub episode_lengths: Vec<usize>,
}

impl EvalResult {
    /// Build from per-episode returns and lengths.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the slices differ in length.
    pub fn from_episodes(step: u64, rewards: &[f64], lengths: &[usize]) -> Self {
        debug_assert_eq!(
            rewards.len(),
            lengths.len(),
            "rewards and lengths must have the same length"
        );

        let finite: Vec<f64> = rewards.iter().copied().filter(|r| r.is_finite()).collect();
        let n_filtered = rewards.len() - finite.len();

        let (mean, std, min, max) = if finite.is_empty() {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            // Welford's algorithm for a numerically stable mean and variance.
            let mut mean = 0.0f64;
            let mut m2 = 0.0f64;
            let mut min_r = f64::MAX;
            let mut max_r = f64::MIN;
            for (i, &r) in finite.iter().enumerate() {
                let delta = r - mean;
                mean += delta / (i + 1) as f64;
                m2 += delta * (r - mean);
                min_r = min_r.min(r);
                max_r = max_r.max(r);
            }
            let variance = if finite.len() > 1 {
                m2 / finite.len() as f64
            } else {
                0.0
            };
            (mean, variance.sqrt(), min_r, max_r)
        };

        let mean_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };

        Self {
            step,
            mean_reward: mean,
            std_reward: std,
            min_reward: min,
            max_reward: max,
            mean_length,
            n_episodes: rewards.len(),
            n_filtered_episodes: n_filtered,
            episode_rewards: rewards.to_vec(),
            episode_lengths: lengths.to_vec(),
        }
    }

    /// Whether at least one episode produced a finite return.
    pub fn has_valid_mean(&self) -> bool {
        self.n_episodes > self.n_filtered_episodes
    }

    /// Mean return over all episodes, non-finite ones included.
    ///
    /// `None` when the pass recorded no episode.
    pub fn score(&self) -> Option<f64> {
        if self.episode_rewards.is_empty() {
            return None;
        }
        Some(self.episode_rewards.iter().sum::<f64>() / self.episode_rewards.len() as f64)
    }
}
