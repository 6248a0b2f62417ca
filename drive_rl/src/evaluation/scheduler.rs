//! Periodic greedy evaluation with best-model tracking.

use tracing::{debug, warn};

use crate::algorithms::{GreedyPolicy, ValueLearner};
use crate::checkpoint::BestCheckpoint;
use crate::core::Image;
use crate::environment::VectorizedEnv;
use crate::error::{ConfigError, DriveError, Result};
use crate::metrics::EvaluationCsv;

use super::EvalResult;

/// Play exactly `n_eval_episodes` greedy episodes on `env`.
///
/// Episodes are spread over the slots so that slot `i` contributes
/// `(n_eval_episodes + i) / n_envs` of them; episodes a slot finishes beyond
/// its share are ignored. Returns and lengths come from the episode records of
/// the monitors inside the host. The host is reset first and left mid-episode.
pub fn evaluate_policy<V, P>(
    env: &mut V,
    policy: &P,
    n_eval_episodes: usize,
    step: u64,
) -> Result<EvalResult>
where
    V: VectorizedEnv<Observation = Image, Action = usize> + ?Sized,
    P: GreedyPolicy + ?Sized,
{
    let n_envs = env.n_envs();
    let targets: Vec<usize> = (0..n_envs).map(|i| (n_eval_episodes + i) / n_envs).collect();
    let mut counts = vec![0usize; n_envs];
    let mut rewards = Vec::with_capacity(n_eval_episodes);
    let mut lengths = Vec::with_capacity(n_eval_episodes);

    let mut observations = env.reset()?;
    while counts.iter().zip(&targets).any(|(c, t)| c < t) {
        let actions = policy.greedy_actions(&observations)?;
        let batch = env.step(&actions)?;

        for (slot, info) in batch.infos.iter().enumerate() {
            if counts[slot] >= targets[slot] {
                continue;
            }
            if let Some(record) = &info.episode {
                rewards.push(record.reward);
                lengths.push(record.length);
                counts[slot] += 1;
            }
        }
        observations = batch.observations;
    }

    Ok(EvalResult::from_episodes(step, &rewards, &lengths))
}

/// Settings of the evaluation scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    /// Host steps between evaluation passes.
    pub eval_freq: u64,
    pub n_eval_episodes: usize,
    /// Consecutive aborted passes tolerated before training stops.
    pub max_consecutive_failures: usize,
}

impl EvalConfig {
    pub fn new(eval_freq: u64, n_eval_episodes: usize) -> Self {
        Self {
            eval_freq,
            n_eval_episodes,
            max_consecutive_failures: 3,
        }
    }

    pub fn with_max_consecutive_failures(mut self, n: usize) -> Self {
        self.max_consecutive_failures = n;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.eval_freq == 0 {
            return Err(ConfigError::Zero("eval_freq"));
        }
        if self.n_eval_episodes == 0 {
            return Err(ConfigError::Zero("n_eval_episodes"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Zero("max_consecutive_failures"));
        }
        Ok(())
    }
}

/// What happened to one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Completed { result: EvalResult, new_best: bool },
    /// The environment failed mid-pass. Nothing was checkpointed.
    Aborted {
        error: String,
        consecutive_failures: usize,
    },
}

/// Runs evaluation passes on a fixed cadence and keeps the best snapshot.
pub struct EvalScheduler {
    config: EvalConfig,
    best: BestCheckpoint,
    csv: Option<EvaluationCsv>,
    consecutive_failures: usize,
    history: Vec<EvalResult>,
}

impl EvalScheduler {
    pub fn new(config: EvalConfig, best: BestCheckpoint) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            best,
            csv: None,
            consecutive_failures: 0,
            history: Vec::new(),
        })
    }

    /// Append every completed pass to `csv`.
    pub fn with_csv(mut self, csv: EvaluationCsv) -> Self {
        self.csv = Some(csv);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn best(&self) -> &BestCheckpoint {
        &self.best
    }

    /// Completed passes, oldest first.
    pub fn history(&self) -> &[EvalResult] {
        &self.history
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Whether a pass is due after `n_calls` host steps.
    pub fn is_due(&self, n_calls: u64) -> bool {
        n_calls > 0 && n_calls % self.config.eval_freq == 0
    }

    /// Run one pass at `num_timesteps` environment steps.
    ///
    /// Environment failures abort only this pass until
    /// `max_consecutive_failures` of them happen in a row, which yields
    /// [`DriveError::EvaluationFailed`]. Any other failure is returned as is.
    pub fn run<V, L>(&mut self, num_timesteps: u64, env: &mut V, learner: &L) -> Result<EvalOutcome>
    where
        V: VectorizedEnv<Observation = Image, Action = usize> + ?Sized,
        L: ValueLearner + ?Sized,
    {
        let result = match evaluate_policy(env, learner, self.config.n_eval_episodes, num_timesteps) {
            Ok(result) => result,
            Err(err) if err.is_environment() => {
                self.consecutive_failures += 1;
                let error = err.to_string();
                warn!(
                    step = num_timesteps,
                    consecutive_failures = self.consecutive_failures,
                    %error,
                    "evaluation aborted"
                );
                if self.consecutive_failures >= self.config.max_consecutive_failures {
                    return Err(DriveError::EvaluationFailed {
                        failures: self.consecutive_failures,
                        last_error: error,
                    });
                }
                return Ok(EvalOutcome::Aborted {
                    error,
                    consecutive_failures: self.consecutive_failures,
                });
            }
            Err(err) => return Err(err),
        };
        self.consecutive_failures = 0;

        if let Some(csv) = &self.csv {
            if let Err(error) = csv.append(&result) {
                warn!(%error, "failed to append evaluation row");
            }
        }

        let new_best = match result.score() {
            Some(score) if score.is_finite() => {
                self.best
                    .offer(num_timesteps, score, |path| learner.save(path))?
            }
            score => {
                debug!(
                    step = num_timesteps,
                    ?score,
                    "non-finite evaluation score, best model unchanged"
                );
                false
            }
        };

        self.history.push(result.clone());
        Ok(EvalOutcome::Completed { result, new_best })
    }
}
