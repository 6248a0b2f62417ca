//! Behavioural tests for the training loop.
//!
//! # Test Organization
//!
//! - `fixtures`: a corridor environment behind the full wrapper stack and a
//!   recording learner
//! - `trainer_tests`: warm-up, update cadence, target sync, replay contents,
//!   evaluation interleaving and failure recovery
//!
//! # Critical Invariants Tested
//!
//! 1. **Terminal vs Truncated Distinction**
//!    - Stored transitions keep both flags as reported by the environment
//!    - The stored next observation of a finished episode is its last frame,
//!      not the first frame of the next one
//!
//! 2. **Cadence**
//!    - No update while `timesteps <= learning_starts`
//!    - Updates every `train_freq` host steps afterwards
//!    - Target sync every `target_update_interval / n_envs` host steps

pub mod trainer_tests;
