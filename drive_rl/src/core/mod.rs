//! Core data types shared by the environment host and the learner.

pub mod episode_state;
pub mod image;
pub mod target_network;
pub mod transition;

pub use episode_state::EpisodeState;
pub use image::{ChannelOrder, Image, ImageShape};
pub use target_network::{hard_copy, TargetSchedule};
pub use transition::Transition;
