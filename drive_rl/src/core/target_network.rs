//! Target network synchronization.
//!
//! The Q-learning target `r + γ · max_a Q_target(s', a)` is computed with a
//! frozen copy of the online network. The copy is refreshed by a hard parameter
//! copy on a fixed schedule measured in host steps.

use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;

/// Copy the online parameters into a gradient-free target module.
pub fn hard_copy<B, M>(online: &M) -> M::InnerModule
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    online.valid()
}

/// Decides on which host steps the target network is refreshed.
///
/// The configured interval counts environment steps. With several hosted
/// environments every host step advances `n_envs` environment steps, so the
/// effective period in host steps is `max(interval / n_envs, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSchedule {
    period: usize,
    syncs: usize,
}

impl TargetSchedule {
    pub fn new(target_update_interval: usize, n_envs: usize) -> Self {
        Self {
            period: (target_update_interval / n_envs.max(1)).max(1),
            syncs: 0,
        }
    }

    /// Period in host steps.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Returns `true` when the host step with 1-based index `n_calls` must
    /// trigger a sync, and records it.
    pub fn tick(&mut self, n_calls: usize) -> bool {
        let due = n_calls > 0 && n_calls % self.period == 0;
        if due {
            self.syncs += 1;
        }
        due
    }

    /// Number of syncs triggered so far.
    pub fn syncs(&self) -> usize {
        self.syncs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::nn::LinearConfig;

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_schedule_divides_by_env_count() {
        assert_eq!(TargetSchedule::new(10_000, 1).period(), 10_000);
        assert_eq!(TargetSchedule::new(10_000, 4).period(), 2_500);
        // Never below one host step.
        assert_eq!(TargetSchedule::new(3, 8).period(), 1);
    }

    #[test]
    fn test_schedule_ticks() {
        let mut schedule = TargetSchedule::new(4, 1);
        let fired: Vec<usize> = (1..=12).filter(|&n| schedule.tick(n)).collect();
        assert_eq!(fired, vec![4, 8, 12]);
        assert_eq!(schedule.syncs(), 3);
        assert!(!schedule.tick(0));
    }

    #[test]
    fn test_hard_copy_matches_online() {
        let device = Default::default();
        let online = LinearConfig::new(4, 3).init::<TestBackend>(&device);
        let target = hard_copy::<TestBackend, _>(&online);
        assert!(!target.weight.val().is_require_grad());

        let a = online.weight.val().into_data().to_vec::<f32>().unwrap();
        let b = target.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(a, b);
    }
}
