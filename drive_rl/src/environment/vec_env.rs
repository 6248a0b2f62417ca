//! Sequential batch host for monitored environments.

use serde_json::Value;
use tracing::debug;

use super::monitor::{EpisodeMonitor, EpisodeRecord};
use super::{Environment, Info, VectorizedEnv};
use crate::error::{DriveError, Result};

/// Per-slot details of one batched step.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo<O> {
    /// Info mapping returned by the slot's step.
    pub info: Info,
    pub terminated: bool,
    pub truncated: bool,
    /// Last observation of the finished episode. Only set when the slot was
    /// auto-reset, in which case the batch observation is the new episode's
    /// first observation.
    pub terminal_observation: Option<O>,
    /// Record of the episode that ended on this step.
    pub episode: Option<EpisodeRecord>,
}

impl<O> SlotInfo<O> {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Result of stepping every slot once.
#[derive(Debug, Clone, PartialEq)]
pub struct VecStep<O> {
    pub observations: Vec<O>,
    pub rewards: Vec<f64>,
    pub dones: Vec<bool>,
    pub infos: Vec<SlotInfo<O>>,
}

impl<O> VecStep<O> {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Records of all episodes that ended on this step.
    pub fn finished_episodes(&self) -> impl Iterator<Item = &EpisodeRecord> {
        self.infos.iter().filter_map(|info| info.episode.as_ref())
    }
}

/// Ordered, fixed-size collection of monitored environments.
///
/// Slots are stepped one after the other on the calling thread. A slot whose
/// episode ends is reset immediately, so every observation in a returned batch
/// is one an action can be chosen from.
pub struct VecEnv<E> {
    slots: Vec<EpisodeMonitor<E>>,
    pending_seed: Option<u64>,
    reset_options: Option<Value>,
}

impl<E: Environment> VecEnv<E> {
    /// Host the given monitored environments in registration order.
    pub fn new(slots: Vec<EpisodeMonitor<E>>) -> Result<Self> {
        if slots.is_empty() {
            return Err(DriveError::ShapeMismatch {
                context: "vectorized host",
                expected: "at least one environment".to_string(),
                actual: "0 environments".to_string(),
            });
        }
        Ok(Self {
            slots,
            pending_seed: None,
            reset_options: None,
        })
    }

    /// Wrap each environment in a fresh [`EpisodeMonitor`] and host them.
    pub fn monitored(envs: impl IntoIterator<Item = E>) -> Result<Self> {
        Self::new(envs.into_iter().map(EpisodeMonitor::new).collect())
    }

    /// Options forwarded to every explicit reset.
    pub fn with_reset_options(mut self, options: Value) -> Self {
        self.reset_options = Some(options);
        self
    }

    pub fn slot(&self, index: usize) -> Option<&EpisodeMonitor<E>> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[EpisodeMonitor<E>] {
        &self.slots
    }

    fn check_actions(&self, n_actions: usize) -> Result<()> {
        if n_actions != self.slots.len() {
            return Err(DriveError::ShapeMismatch {
                context: "vectorized step actions",
                expected: format!("{} actions", self.slots.len()),
                actual: format!("{n_actions} actions"),
            });
        }
        Ok(())
    }
}

impl<E: Environment> VectorizedEnv for VecEnv<E> {
    type Observation = E::Observation;
    type Action = E::Action;

    fn n_envs(&self) -> usize {
        self.slots.len()
    }

    fn reset(&mut self) -> Result<Vec<Self::Observation>> {
        let seed = self.pending_seed.take();
        let options = self.reset_options.as_ref();
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(i, slot)| {
                let slot_seed = seed.map(|s| s.wrapping_add(i as u64));
                slot.reset(slot_seed, options)
                    .map(|(observation, _)| observation)
                    .map_err(DriveError::environment)
            })
            .collect()
    }

    fn step(&mut self, actions: &[Self::Action]) -> Result<VecStep<Self::Observation>> {
        self.check_actions(actions.len())?;

        let n = self.slots.len();
        let mut observations = Vec::with_capacity(n);
        let mut rewards = Vec::with_capacity(n);
        let mut dones = Vec::with_capacity(n);
        let mut infos = Vec::with_capacity(n);

        for (index, (slot, action)) in self.slots.iter_mut().zip(actions).enumerate() {
            let step = slot.step(action).map_err(DriveError::environment)?;
            let done = step.done();

            let (observation, terminal_observation, episode) = if done {
                let episode = slot.last_record().cloned();
                let (fresh, _) = slot.reset(None, None).map_err(DriveError::environment)?;
                debug!(slot = index, "auto-reset after episode end");
                (fresh, Some(step.observation), episode)
            } else {
                (step.observation, None, None)
            };

            observations.push(observation);
            rewards.push(step.reward);
            dones.push(done);
            infos.push(SlotInfo {
                info: step.info,
                terminated: step.terminated,
                truncated: step.truncated,
                terminal_observation,
                episode,
            });
        }

        Ok(VecStep {
            observations,
            rewards,
            dones,
            infos,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.pending_seed = Some(seed);
    }
}
