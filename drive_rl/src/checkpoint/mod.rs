//! Model checkpointing.

pub mod best;

pub use best::{BestCheckpoint, TrainingCheckpoint, BEST_METADATA_FILE, BEST_MODEL_FILE};
