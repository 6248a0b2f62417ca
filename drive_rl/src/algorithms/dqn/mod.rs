//! DQN (Deep Q-Network) for discrete control from camera frames.
//!
//! # Architecture
//!
//! ```text
//! Online Q-network (trained)          Target Q-network (frozen copy)
//! ├── Conv 32·8x8/4 → ReLU            refreshed from the online network
//! ├── Conv 64·4x4/2 → ReLU            every `target_update_interval`
//! ├── Conv 64·3x3/1 → ReLU            environment steps
//! ├── Linear → features → ReLU
//! └── Linear → Q(s, ·)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use drive_rl::algorithms::dqn::{adam_optimizer, DqnAgent, DqnConfig, QNetworkConfig};
//!
//! let config = DqnConfig::default();
//! let network = QNetworkConfig::new(ImageShape::new(84, 84, 1), 6);
//! let agent = DqnAgent::<MyBackend, _>::new(network, &config, adam_optimizer(&config), device)?;
//! ```

mod config;
#[allow(clippy::module_inception)]
mod dqn;
mod q_network;

pub use config::DqnConfig;
pub use dqn::{adam_optimizer, DqnAgent, QPolicy};
pub use q_network::{images_to_tensor, QNetwork, QNetworkConfig};
