//! Episode end classification.
//!
//! The uniform step contract reports two flags per step. This module folds them
//! into a single state so the replay buffer, the monitor and the value target
//! all agree on what an episode end means:
//!
//! - **Terminated**: the episode reached an absorbing state (crash, off-road).
//!   No future reward is possible, the TD target does not bootstrap.
//! - **Truncated**: an external limit ended the episode (time limit). The state
//!   itself is not absorbing, the TD target still bootstraps from the next
//!   observation.

/// Episode state derived from the terminated/truncated flags of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EpisodeState {
    /// Episode is ongoing.
    #[default]
    Running,
    /// Episode ended in an absorbing state.
    Terminated,
    /// Episode was cut off by an external limit.
    Truncated,
}

impl EpisodeState {
    /// Classify a step. Terminated takes precedence when both flags are set.
    #[inline]
    pub fn from_flags(terminated: bool, truncated: bool) -> Self {
        if terminated {
            Self::Terminated
        } else if truncated {
            Self::Truncated
        } else {
            Self::Running
        }
    }

    /// Whether the episode ended (either way).
    #[inline]
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Running)
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated)
    }

    /// Multiplier applied to the bootstrapped next-state value.
    ///
    /// `0.0` only for absorbing states; truncated and running steps bootstrap.
    #[inline]
    pub fn bootstrap_mask(&self) -> f32 {
        if self.is_terminated() {
            0.0
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags_terminated() {
        let state = EpisodeState::from_flags(true, false);
        assert_eq!(state, EpisodeState::Terminated);
        assert!(state.is_done());
        assert_eq!(state.bootstrap_mask(), 0.0);
    }

    #[test]
    fn test_from_flags_truncated() {
        let state = EpisodeState::from_flags(false, true);
        assert_eq!(state, EpisodeState::Truncated);
        assert!(state.is_done());
        // Time limits are not absorbing.
        assert_eq!(state.bootstrap_mask(), 1.0);
    }

    #[test]
    fn test_from_flags_running() {
        let state = EpisodeState::from_flags(false, false);
        assert_eq!(state, EpisodeState::Running);
        assert!(!state.is_done());
        assert_eq!(state.bootstrap_mask(), 1.0);
    }

    #[test]
    fn test_terminated_takes_precedence() {
        assert_eq!(EpisodeState::from_flags(true, true), EpisodeState::Terminated);
    }

    #[test]
    fn test_default_is_running() {
        assert_eq!(EpisodeState::default(), EpisodeState::Running);
    }
}
