//! Synthetic lane-keeping car environment.
//!
//! A kinematic car drives along a sinusoidal road and is observed through a
//! top-down grayscale camera (84x84x1 by default). Six discrete commands
//! control it: brake, straight, hard right, hard left, soft right, soft left.
//!
//! The environment deliberately speaks the *legacy* step convention
//! (`(frame, reward, done, info)` with a bare frame from `reset`), so it is
//! meant to be wrapped in a [`CompatibilityAdapter`](drive_rl::CompatibilityAdapter).
//!
//! # Example
//!
//! ```rust,ignore
//! use drive_rl::{CompatibilityAdapter, VecEnv, VecTransposeImage};
//! use lane_keeping::{LaneKeeping, LaneKeepingConfig};
//!
//! let config = LaneKeepingConfig::default();
//! let envs = (0..4).map(|_| LaneKeeping::new(config.clone()).map(CompatibilityAdapter::new));
//! let host = VecEnv::monitored(envs.collect::<anyhow::Result<Vec<_>>>()?)?;
//! let host = VecTransposeImage::new(host, config.image);
//! ```

pub mod config;
pub mod env;
pub mod render;
pub mod road;

pub use config::{LaneKeepingConfig, RewardConfig, RoadConfig, VehicleConfig};
pub use env::{CarState, Controls, DriveAction, LaneKeeping, N_ACTIONS};
pub use render::Pose;
pub use road::Road;
