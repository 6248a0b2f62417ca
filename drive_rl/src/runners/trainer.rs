//! Off-policy training loop.
//!
//! # Loop
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  act      random before warm-up, then ε-greedy per slot       │
//! │  step     host.step(actions), auto-reset of finished slots    │
//! │  store    (s, a, r, s', terminated, truncated) into replay    │
//! │  sync     every target_update_interval / n_envs host steps    │
//! │  evaluate every eval_freq host steps, then reset the host     │
//! │  train    every train_freq host steps once past warm-up       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the calling thread. The host is borrowed mutably by the
//! trainer and lent to the evaluation scheduler between steps, so training
//! and evaluation never overlap.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::algorithms::{DqnConfig, ValueLearner};
use crate::buffers::ReplayBuffer;
use crate::core::{Image, TargetSchedule, Transition};
use crate::environment::VectorizedEnv;
use crate::error::{ConfigError, DriveError, Result};
use crate::evaluation::{EvalOutcome, EvalScheduler};
use crate::metrics::{MetricsLogger, TrainingMetrics, TrainingSnapshot};

/// Totals reported when [`Trainer::learn`] returns.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub timesteps: u64,
    pub host_steps: u64,
    pub episodes: u64,
    pub n_updates: u64,
    pub target_syncs: usize,
    /// Completed evaluation passes.
    pub evaluations: usize,
    pub best_mean_reward: Option<f64>,
    pub elapsed_secs: f64,
}

/// Drives a [`ValueLearner`] against a vectorized host.
pub struct Trainer<L: ValueLearner> {
    learner: L,
    config: DqnConfig,
    buffer: ReplayBuffer,
    rng: fastrand::Rng,
    metrics: TrainingMetrics,
    eval: Option<EvalScheduler>,
    log_interval: usize,
    seed: Option<u64>,
}

impl<L: ValueLearner> Trainer<L> {
    /// Validate the hyperparameters and allocate the replay buffer.
    pub fn new(learner: L, config: DqnConfig) -> Result<Self> {
        config.validate_hyperparameters()?;
        Ok(Self {
            buffer: ReplayBuffer::new(config.buffer_size),
            learner,
            config,
            rng: fastrand::Rng::new(),
            metrics: TrainingMetrics::new(),
            eval: None,
            log_interval: 4,
            seed: None,
        })
    }

    /// Seed action sampling, replay sampling and the host's first reset.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self.seed = Some(seed);
        self
    }

    pub fn with_evaluation(mut self, eval: EvalScheduler) -> Self {
        self.eval = Some(eval);
        self
    }

    /// Report progress every `interval` finished training episodes.
    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn evaluation(&self) -> Option<&EvalScheduler> {
        self.eval.as_ref()
    }

    /// Train for `total_timesteps` environment steps.
    ///
    /// The budget is checked before the host is touched. Environment failures
    /// during training are returned; failures during evaluation are handled
    /// by the scheduler.
    ///
    /// Every call starts its own run: step counters, warm-up and the
    /// exploration schedule restart from zero. The replay buffer, the learner
    /// and the best evaluation score carry over.
    pub fn learn<V>(
        &mut self,
        env: &mut V,
        total_timesteps: i64,
        logger: &mut dyn MetricsLogger,
    ) -> Result<TrainingSummary>
    where
        V: VectorizedEnv<Observation = Image, Action = usize> + ?Sized,
    {
        if total_timesteps <= 0 {
            return Err(ConfigError::NonPositiveStepBudget(total_timesteps).into());
        }
        let total = total_timesteps as u64;
        self.metrics.reset();
        let n_envs = env.n_envs();
        let exploration = self.config.exploration();
        let mut target = TargetSchedule::new(self.config.target_update_interval, n_envs);
        let start = Instant::now();

        info!(
            total_timesteps = total,
            n_envs,
            learning_starts = self.config.learning_starts,
            buffer_size = self.config.buffer_size,
            "starting training"
        );

        if let Some(seed) = self.seed {
            env.seed(seed);
        }
        let mut observations = env.reset()?;
        let mut n_calls: u64 = 0;

        while self.metrics.timesteps() < total {
            let epsilon = exploration.value(self.metrics.timesteps(), total);
            let actions = self.select_actions(&observations, epsilon)?;

            let batch = env.step(&actions)?;
            n_calls += 1;
            self.metrics.add_host_step(n_envs);

            let mut log_due = false;
            for (slot, info) in batch.infos.iter().enumerate() {
                let next = match (&info.terminal_observation, info.done()) {
                    (Some(terminal), true) => terminal.clone(),
                    _ => batch.observations[slot].clone(),
                };
                self.buffer.push(Transition::new(
                    observations[slot].clone(),
                    actions[slot],
                    batch.rewards[slot] as f32,
                    next,
                    info.terminated,
                    info.truncated,
                ));
                if let Some(record) = &info.episode {
                    self.metrics.record_episode(record);
                    log_due |= self.metrics.episodes() % self.log_interval as u64 == 0;
                }
            }
            observations = batch.observations;

            if target.tick(n_calls as usize) {
                self.learner.sync_target();
                debug!(host_steps = n_calls, syncs = target.syncs(), "target network synced");
            }

            if let Some(eval) = self.eval.as_mut() {
                if eval.is_due(n_calls) {
                    let outcome = eval.run(self.metrics.timesteps(), env, &self.learner)?;
                    if let EvalOutcome::Completed { result, .. } = &outcome {
                        logger.log_eval(result);
                    }
                    observations = env.reset()?;
                }
            }

            if log_due {
                logger.log(&self.snapshot(epsilon, start));
            }

            if n_calls % self.config.train_freq as u64 == 0
                && self.metrics.timesteps() > self.config.learning_starts
            {
                self.train()?;
            }
        }

        let epsilon = exploration.value(self.metrics.timesteps(), total);
        logger.log(&self.snapshot(epsilon, start));
        logger.flush();

        let summary = TrainingSummary {
            timesteps: self.metrics.timesteps(),
            host_steps: self.metrics.host_steps(),
            episodes: self.metrics.episodes(),
            n_updates: self.learner.n_updates(),
            target_syncs: target.syncs(),
            evaluations: self.eval.as_ref().map_or(0, |e| e.history().len()),
            best_mean_reward: self.eval.as_ref().and_then(|e| e.best().best_mean()),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            timesteps = summary.timesteps,
            episodes = summary.episodes,
            n_updates = summary.n_updates,
            best_mean_reward = ?summary.best_mean_reward,
            "training finished"
        );
        Ok(summary)
    }

    /// Write the learner's current parameters to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.learner.save(path.as_ref())?;
        info!(path = %path.as_ref().display(), "policy saved");
        Ok(())
    }

    fn select_actions(&mut self, observations: &[Image], epsilon: f64) -> Result<Vec<usize>> {
        let n_actions = self.learner.n_actions();
        if self.metrics.timesteps() < self.config.learning_starts {
            return Ok((0..observations.len())
                .map(|_| self.rng.usize(..n_actions))
                .collect());
        }

        let explore: Vec<bool> = (0..observations.len())
            .map(|_| self.rng.f64() < epsilon)
            .collect();
        let greedy = if explore.iter().all(|&e| e) {
            Vec::new()
        } else {
            let greedy = self.learner.greedy_actions(observations)?;
            if greedy.len() != observations.len() {
                return Err(DriveError::ShapeMismatch {
                    context: "greedy actions",
                    expected: format!("{} actions", observations.len()),
                    actual: format!("{} actions", greedy.len()),
                });
            }
            greedy
        };

        Ok(explore
            .iter()
            .enumerate()
            .map(|(i, &e)| if e { self.rng.usize(..n_actions) } else { greedy[i] })
            .collect())
    }

    fn train(&mut self) -> Result<()> {
        for _ in 0..self.config.gradient_steps {
            let Some(batch) = self.buffer.sample(self.config.batch_size, &mut self.rng) else {
                debug!(
                    stored = self.buffer.len(),
                    batch_size = self.config.batch_size,
                    "not enough transitions, update skipped"
                );
                return Ok(());
            };
            let loss = self.learner.train_step(&batch)?;
            self.metrics.record_loss(loss);
        }
        Ok(())
    }

    fn snapshot(&self, epsilon: f64, start: Instant) -> TrainingSnapshot {
        TrainingSnapshot::new(
            self.metrics.timesteps(),
            self.metrics.host_steps(),
            self.metrics.episodes(),
        )
        .with_episode_stats(self.metrics.avg_reward(), self.metrics.avg_length())
        .with_exploration_rate(epsilon)
        .with_updates(self.learner.n_updates(), self.metrics.last_loss())
        .with_learning_rate(self.config.learning_rate)
        .with_elapsed(start.elapsed().as_secs_f64())
    }
}
