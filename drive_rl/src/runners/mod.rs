//! Training runner.
//!
//! - [`Trainer`]: single-threaded off-policy loop over a vectorized host,
//!   with periodic evaluation through an
//!   [`EvalScheduler`](crate::evaluation::EvalScheduler)
//! - [`TrainConfig`]: step budget, evaluation cadence, output paths

pub mod config;
pub mod trainer;

#[cfg(test)]
pub mod tests;

pub use config::TrainConfig;
pub use trainer::{Trainer, TrainingSummary};
