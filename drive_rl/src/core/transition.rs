//! Replay transitions.

use super::episode_state::EpisodeState;
use super::image::Image;

/// One stored step of experience.
///
/// Observations are kept in the algorithm's layout (channel-first). When the
/// step ended an episode, `next_observation` is the true terminal observation,
/// not the first observation of the auto-reset episode.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation the action was chosen from.
    pub observation: Image,
    /// Discrete action index.
    pub action: usize,
    /// Reward received for the step.
    pub reward: f32,
    /// Observation after the step.
    pub next_observation: Image,
    /// Episode reached an absorbing state.
    pub terminated: bool,
    /// Episode was cut off by an external limit.
    pub truncated: bool,
}

impl Transition {
    pub fn new(
        observation: Image,
        action: usize,
        reward: f32,
        next_observation: Image,
        terminated: bool,
        truncated: bool,
    ) -> Self {
        Self {
            observation,
            action,
            reward,
            next_observation,
            terminated,
            truncated,
        }
    }

    /// Check if the episode ended (terminated or truncated).
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }

    pub fn episode_state(&self) -> EpisodeState {
        EpisodeState::from_flags(self.terminated, self.truncated)
    }
}
