//! Greedy policy evaluation.
//!
//! [`evaluate_policy`] plays a fixed number of episodes with the greedy policy
//! and aggregates them into an [`EvalResult`]. [`EvalScheduler`] calls it every
//! `eval_freq` host steps during training and keeps the best snapshot.

pub mod eval_result;
pub mod scheduler;

pub use eval_result::EvalResult;
pub use scheduler::{evaluate_policy, EvalConfig, EvalOutcome, EvalScheduler};
