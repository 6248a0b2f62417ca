//! Training progress counters owned by the trainer.

use std::collections::VecDeque;

use crate::environment::EpisodeRecord;

/// Number of recent episodes averaged for progress reporting.
pub const EPISODE_WINDOW: usize = 100;

/// Counters and a rolling window of recent training episodes.
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    /// Environment steps (every slot of every host step).
    timesteps: u64,
    /// Host steps (calls to the batched `step`).
    host_steps: u64,
    episodes: u64,
    recent: VecDeque<(f64, usize)>,
    window: usize,
    last_loss: Option<f32>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::with_window(EPISODE_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            timesteps: 0,
            host_steps: 0,
            episodes: 0,
            recent: VecDeque::with_capacity(window),
            window: window.max(1),
            last_loss: None,
        }
    }

    /// Record one host step over `n_envs` slots.
    pub fn add_host_step(&mut self, n_envs: usize) {
        self.host_steps += 1;
        self.timesteps += n_envs as u64;
    }

    /// Record a finished training episode.
    pub fn record_episode(&mut self, record: &EpisodeRecord) {
        self.episodes += 1;
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back((record.reward, record.length));
    }

    /// Zero every counter and empty the window, keeping its size.
    pub fn reset(&mut self) {
        *self = Self::with_window(self.window);
    }

    pub fn record_loss(&mut self, loss: f32) {
        self.last_loss = Some(loss);
    }

    pub fn timesteps(&self) -> u64 {
        self.timesteps
    }

    pub fn host_steps(&self) -> u64 {
        self.host_steps
    }

    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    /// Mean return over the window, 0 with no finished episode.
    pub fn avg_reward(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().map(|(r, _)| r).sum::<f64>() / self.recent.len() as f64
    }

    pub fn avg_length(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().map(|&(_, l)| l as f64).sum::<f64>() / self.recent.len() as f64
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
