//! Builds the vectorized lane-keeping host.

use std::path::Path;

use drive_rl::{CompatibilityAdapter, EpisodeMonitor, VecEnv, VecTransposeImage};
use lane_keeping::{LaneKeeping, LaneKeepingConfig};

pub type LaneKeepingHost = VecTransposeImage<VecEnv<CompatibilityAdapter<LaneKeeping>>>;

/// `n_envs` monitored environments, transposed to channel-first.
///
/// With `monitor_dir`, slot `i` appends its finished episodes to
/// `monitor_<i>.jsonl` there.
pub fn build(
    config: &LaneKeepingConfig,
    n_envs: usize,
    monitor_dir: Option<&Path>,
) -> anyhow::Result<LaneKeepingHost> {
    let mut slots = Vec::with_capacity(n_envs);
    for i in 0..n_envs {
        let env = CompatibilityAdapter::new(LaneKeeping::new(config.clone())?);
        let mut monitor = EpisodeMonitor::new(env);
        if let Some(dir) = monitor_dir {
            monitor = monitor.with_log_file(dir.join(format!("monitor_{i}.jsonl")))?;
        }
        slots.push(monitor);
    }
    Ok(VecTransposeImage::new(VecEnv::new(slots)?, config.image))
}
