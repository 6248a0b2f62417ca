//! Step-dependent hyperparameter schedules.

pub mod exploration;

pub use exploration::ExplorationSchedule;
