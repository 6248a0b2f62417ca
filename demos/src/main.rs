//! DQN lane keeping from camera frames.
//!
//! ```bash
//! # Train with the default hyperparameters (500k steps, eval every 10k)
//! cargo run --release --bin drive-dqn -- train
//!
//! # Shorter run from a YAML file, overriding the seed
//! cargo run --release --bin drive-dqn -- train --config run.yaml --seed 7
//!
//! # Greedy evaluation of a saved policy
//! cargo run --release --bin drive-dqn -- evaluate --policy dqn_drive_policy --episodes 10
//!
//! # GPU backend
//! cargo run --release --features wgpu --bin drive-dqn -- train
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).
#![recursion_limit = "256"]

mod evaluate;
mod host;
mod run_config;
mod train;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray<f32>;
#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferenceBackend>;

/// Train and evaluate a DQN driving policy on the lane-keeping environment.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a policy, evaluating it periodically.
    Train(TrainArgs),
    /// Play greedy episodes with a saved policy.
    Evaluate(EvaluateArgs),
}

#[derive(clap::Args, Debug)]
pub struct TrainArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Environment steps to train for.
    #[arg(long)]
    pub total_steps: Option<i64>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Parent directory of the per-run metrics directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    /// Directory of the best-model slot.
    #[arg(long)]
    pub best_model_dir: Option<PathBuf>,
    /// Where the final policy is written.
    #[arg(long)]
    pub policy_path: Option<PathBuf>,
    #[arg(long)]
    pub n_envs: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct EvaluateArgs {
    /// Saved policy (as passed to `train --policy-path`).
    #[arg(long, default_value = "dqn_drive_policy")]
    pub policy: PathBuf,
    #[arg(long, default_value_t = 5)]
    pub episodes: usize,
    /// YAML run configuration the policy was trained with.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set global default tracing subscriber")
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => train::run(args),
        Command::Evaluate(args) => evaluate::run(args),
    }
}
