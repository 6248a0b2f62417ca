//! Error types for the training pipeline.
//!
//! Failures are grouped by how the pipeline reacts to them:
//!
//! - [`DriveError::ShapeMismatch`]: an observation or action violates the declared
//!   contract. Always fatal, never silently reshaped.
//! - [`DriveError::Environment`]: the wrapped environment itself failed. Propagated
//!   to whichever phase (training step or evaluation pass) made the call.
//! - [`DriveError::EvaluationFailed`]: evaluation kept failing across passes.
//! - [`ConfigError`]: invalid hyperparameters, reported before any interaction.
//!
//! Unrecognized step results and empty replay samples are not errors. They are
//! handled locally by the compatibility adapter and the trainer respectively.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DriveError>;

/// Top-level error for environment hosting, training and evaluation.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Observation or action batch does not match the declared contract.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    /// The underlying environment raised during reset or step.
    #[error("environment failure: {0:#}")]
    Environment(anyhow::Error),

    /// Evaluation failed on too many consecutive passes.
    #[error("evaluation failed on {failures} consecutive passes, last error: {last_error}")]
    EvaluationFailed { failures: usize, last_error: String },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Learning algorithm failure (tensor extraction, parameter recording).
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Filesystem failure while writing logs or checkpoints.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DriveError {
    /// Wrap a failure coming from the underlying environment.
    pub fn environment(err: anyhow::Error) -> Self {
        Self::Environment(err)
    }

    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error originated in the wrapped environment.
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::Environment(_))
    }
}

/// Invalid hyperparameter or run configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step budget must be positive, got {0}")]
    NonPositiveStepBudget(i64),

    #[error("replay buffer ({buffer_size}) is smaller than the batch size ({batch_size})")]
    BufferSmallerThanBatch {
        buffer_size: usize,
        batch_size: usize,
    },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("final exploration rate {final_eps} exceeds initial rate {initial_eps}")]
    IncreasingExploration { initial_eps: f64, final_eps: f64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
}

/// Failure inside the learning algorithm.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("tensor data error: {0}")]
    Tensor(String),

    #[error("parameter record error: {0}")]
    Record(String),

    #[error("cannot train on an empty batch")]
    EmptyBatch,
}
