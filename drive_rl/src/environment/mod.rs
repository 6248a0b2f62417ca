//! Environment contract and the wrappers that build the training host.
//!
//! The stack, innermost first:
//!
//! ```text
//! RawEnvironment ─▶ CompatibilityAdapter ─▶ EpisodeMonitor ─▶ VecEnv ─▶ VecTransposeImage
//!   (legacy or       (uniform 5-field        (episode          (batch,     (HWC ─▶ CHW)
//!    modern results)   step contract)          records)          auto-reset)
//! ```
//!
//! Single environments speak [`Environment`] and report failures as
//! `anyhow::Error`. Batched hosts speak [`VectorizedEnv`] and wrap those
//! failures in [`DriveError::Environment`](crate::error::DriveError).

pub mod compat;
pub mod monitor;
pub mod raw;
pub mod transpose;
pub mod vec_env;


use serde_json::Value;

use crate::core::EpisodeState;
use crate::error::Result;

pub use compat::{CompatibilityAdapter, TRUNCATION_KEY};
pub use monitor::{EpisodeMonitor, EpisodeRecord, DEFAULT_HISTORY, EPISODE_INFO_KEY};
pub use raw::{RawReset, RawStep};
pub use transpose::VecTransposeImage;
pub use vec_env::{SlotInfo, VecEnv, VecStep};

/// Auxiliary per-step information. Always a mapping.
pub type Info = serde_json::Map<String, Value>;

/// Normalized result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<O> {
    pub observation: O,
    pub reward: f64,
    /// Episode reached an absorbing state.
    pub terminated: bool,
    /// Episode was cut off by an external limit.
    pub truncated: bool,
    pub info: Info,
}

impl<O> Step<O> {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }

    pub fn episode_state(&self) -> EpisodeState {
        EpisodeState::from_flags(self.terminated, self.truncated)
    }
}

/// An underlying control environment with an unnormalized result format.
///
/// Implemented by simulator bridges. Either convention may be returned from
/// any call; the [`CompatibilityAdapter`] sorts them out.
pub trait RawEnvironment {
    type Observation;
    type Action;

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Value>,
    ) -> anyhow::Result<RawReset<Self::Observation>>;

    fn step(&mut self, action: &Self::Action) -> anyhow::Result<RawStep<Self::Observation>>;
}

/// A single environment speaking the uniform contract.
pub trait Environment {
    type Observation: Clone;
    type Action;

    /// Start a new episode.
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&Value>,
    ) -> anyhow::Result<(Self::Observation, Info)>;

    /// Advance by one action.
    fn step(&mut self, action: &Self::Action) -> anyhow::Result<Step<Self::Observation>>;
}

/// A fixed-size ordered batch of environments stepped in lockstep.
///
/// Slot `i` of every returned batch belongs to the `i`-th registered
/// environment. Slots whose episode ended are reset before `step` returns.
pub trait VectorizedEnv {
    type Observation;
    type Action;

    /// Number of hosted environments.
    fn n_envs(&self) -> usize;

    /// Reset every slot and return the initial observations.
    fn reset(&mut self) -> Result<Vec<Self::Observation>>;

    /// Step every slot with its action.
    fn step(&mut self, actions: &[Self::Action]) -> Result<VecStep<Self::Observation>>;

    /// Seed the next reset. Slot `i` receives `seed + i`.
    fn seed(&mut self, seed: u64);
}
