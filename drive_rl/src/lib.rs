//! # drive_rl: DQN training and evaluation for camera-driven cars
//!
//! Trains a value-based policy that steers a car from grayscale camera
//! frames, evaluates it periodically and keeps the best snapshot.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Trainer (one thread)                        │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  RawEnvironment × N                                                 │
//! │    └▶ CompatibilityAdapter   legacy 4-tuple / modern 5-tuple        │
//! │        └▶ EpisodeMonitor     episode return, length, wall time      │
//! │            └▶ VecEnv         ordered batch, auto-reset              │
//! │                └▶ VecTransposeImage   HWC ─▶ CHW                    │
//! │                        │                                            │
//! │            ┌───────────┴───────────┐                                │
//! │            ▼                       ▼                                │
//! │   ┌─────────────────┐     ┌─────────────────┐                       │
//! │   │  ReplayBuffer   │     │  EvalScheduler  │──▶ best_model.bin     │
//! │   │  (FIFO, uniform)│     │  (greedy passes)│    best_model.json    │
//! │   └────────┬────────┘     └─────────────────┘                       │
//! │            ▼                                                        │
//! │   ┌─────────────────┐                                               │
//! │   │  ValueLearner   │  DqnAgent: online + frozen target Q-network   │
//! │   └─────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drive_rl::{adam_optimizer, DqnAgent, DqnConfig, QNetworkConfig, Trainer};
//!
//! let config = DqnConfig::default();
//! let network = QNetworkConfig::new(ImageShape::new(84, 84, 1), 6);
//! let agent = DqnAgent::<B, _>::new(network, &config, adam_optimizer(&config), device)?;
//!
//! let mut trainer = Trainer::new(agent, config)?.with_evaluation(eval);
//! trainer.learn(&mut env, 500_000, &mut logger)?;
//! trainer.save("dqn_drive_policy")?;
//! ```

pub mod algorithms;
pub mod buffers;
pub mod checkpoint;
pub mod core;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod runners;
pub mod scheduling;

pub use crate::core::{ChannelOrder, EpisodeState, Image, ImageShape, TargetSchedule, Transition};

pub use error::{AgentError, ConfigError, DriveError, Result};

pub use algorithms::{
    adam_optimizer, DqnAgent, DqnConfig, GreedyPolicy, QNetwork, QNetworkConfig, QPolicy,
    ValueLearner,
};

pub use buffers::ReplayBuffer;

pub use environment::{
    CompatibilityAdapter, EpisodeMonitor, EpisodeRecord, Environment, Info, RawEnvironment,
    RawReset, RawStep, Step, VecEnv, VecStep, VecTransposeImage, VectorizedEnv,
};

pub use evaluation::{evaluate_policy, EvalConfig, EvalOutcome, EvalResult, EvalScheduler};

pub use checkpoint::{BestCheckpoint, TrainingCheckpoint};

pub use metrics::{
    ConsoleLogger, CsvLogger, EvaluationCsv, MetricsLogger, MultiLogger, TrainingSnapshot,
};

pub use runners::{TrainConfig, Trainer, TrainingSummary};

pub use scheduling::ExplorationSchedule;
