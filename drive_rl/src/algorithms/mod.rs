//! Learning algorithms behind the [`ValueLearner`] boundary.

pub mod dqn;
pub mod value_learner;

pub use dqn::{adam_optimizer, DqnAgent, DqnConfig, QNetwork, QNetworkConfig, QPolicy};
pub use value_learner::{GreedyPolicy, ValueLearner};
