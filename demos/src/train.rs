//! `drive-dqn train`

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use drive_rl::{
    adam_optimizer, BestCheckpoint, ConsoleLogger, CsvLogger, DqnAgent, EvalScheduler,
    EvaluationCsv, MultiLogger, QNetworkConfig, Trainer,
};
use lane_keeping::N_ACTIONS;
use tracing::info;

use crate::run_config::RunConfig;
use crate::{host, TrainArgs, TrainBackend};

/// Apply command-line overrides on top of the file (or default) config.
pub fn resolve(args: &TrainArgs) -> anyhow::Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let train = &mut config.train;
    if let Some(total) = args.total_steps {
        train.total_timesteps = total;
    }
    if let Some(seed) = args.seed {
        train.seed = Some(seed);
    }
    if let Some(dir) = &args.log_dir {
        train.log_dir = dir.clone();
    }
    if let Some(dir) = &args.best_model_dir {
        train.best_model_dir = Some(dir.clone());
    }
    if let Some(path) = &args.policy_path {
        train.policy_path = path.clone();
    }
    if let Some(n_envs) = args.n_envs {
        train.n_envs = n_envs;
    }
    Ok(config)
}

pub fn run(args: TrainArgs) -> anyhow::Result<()> {
    let config = resolve(&args)?;
    config.validate()?;
    let RunConfig { train, dqn, env } = &config;

    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let run_dir = train.run_dir(started);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;
    config.save(run_dir.join("config.yaml"))?;
    info!(run_dir = %run_dir.display(), "run directory ready");

    let mut venv = host::build(env, train.n_envs, Some(&run_dir))?;

    let device = Default::default();
    let network = QNetworkConfig::new(env.image, N_ACTIONS).with_features_dim(dqn.features_dim);
    let optimizer = adam_optimizer::<TrainBackend>(dqn);
    let agent = DqnAgent::<TrainBackend, _>::new(network, dqn, optimizer, device)?;

    let best = match &train.best_model_dir {
        Some(dir) => BestCheckpoint::new(dir)?,
        None => BestCheckpoint::in_memory(),
    };
    let eval = EvalScheduler::new(train.eval_config(), best)?
        .with_csv(EvaluationCsv::create(run_dir.join("evaluations.csv"))?);

    let mut trainer = Trainer::new(agent, dqn.clone())?
        .with_evaluation(eval)
        .with_log_interval(train.log_interval);
    if let Some(seed) = train.seed {
        trainer = trainer.with_seed(seed);
    }

    let mut logger = MultiLogger::new()
        .add(ConsoleLogger::new())
        .add(CsvLogger::new(run_dir.join("progress.csv"))?);

    let summary = trainer.learn(&mut venv, train.total_timesteps, &mut logger)?;
    trainer.save(&train.policy_path)?;

    info!(
        timesteps = summary.timesteps,
        episodes = summary.episodes,
        n_updates = summary.n_updates,
        evaluations = summary.evaluations,
        best_mean_reward = ?summary.best_mean_reward,
        elapsed_secs = format_args!("{:.1}", summary.elapsed_secs),
        policy = %train.policy_path.display(),
        "done"
    );
    Ok(())
}
