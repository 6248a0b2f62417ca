//! Boundary between the training orchestrator and a value-based algorithm.
//!
//! The orchestrator decides *when* to act greedily, update and sync; the
//! learner decides *how*. Any implementation of these traits can be trained
//! and evaluated by [`Trainer`](crate::runners::Trainer).

use std::path::Path;

use crate::core::{Image, Transition};
use crate::error::AgentError;

/// Deterministic action selection from channel-first observations.
pub trait GreedyPolicy {
    /// Size of the discrete action space.
    fn n_actions(&self) -> usize;

    /// Action with the highest value for each observation, in batch order.
    fn greedy_actions(&self, observations: &[Image]) -> Result<Vec<usize>, AgentError>;
}

/// Off-policy learner with a target network.
pub trait ValueLearner: GreedyPolicy {
    /// One gradient update on a sampled batch. Returns the loss.
    fn train_step(&mut self, batch: &[Transition]) -> Result<f32, AgentError>;

    /// Copy online parameters into the target network.
    fn sync_target(&mut self);

    /// Persist the online parameters.
    fn save(&self, path: &Path) -> Result<(), AgentError>;

    /// Gradient updates performed so far.
    fn n_updates(&self) -> u64;
}
