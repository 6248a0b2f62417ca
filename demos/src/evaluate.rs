//! `drive-dqn evaluate`

use drive_rl::{evaluate_policy, QNetworkConfig, QPolicy, VectorizedEnv};
use lane_keeping::N_ACTIONS;
use tracing::info;

use crate::run_config::RunConfig;
use crate::{host, EvaluateArgs, InferenceBackend};

pub fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.env.validate()?;
    anyhow::ensure!(args.episodes > 0, "--episodes must be > 0");

    let device = Default::default();
    let network =
        QNetworkConfig::new(config.env.image, N_ACTIONS).with_features_dim(config.dqn.features_dim);
    let policy = QPolicy::<InferenceBackend>::load(&args.policy, network, device)?;

    let mut venv = host::build(&config.env, 1, None)?;
    if let Some(seed) = args.seed {
        venv.seed(seed);
    }

    let result = evaluate_policy(&mut venv, &policy, args.episodes, 0)?;
    info!(
        policy = %args.policy.display(),
        episodes = result.n_episodes,
        mean_reward = format_args!("{:.2}", result.mean_reward),
        std_reward = format_args!("{:.2}", result.std_reward),
        min_reward = format_args!("{:.2}", result.min_reward),
        max_reward = format_args!("{:.2}", result.max_reward),
        mean_length = format_args!("{:.1}", result.mean_length),
        "evaluation finished"
    );
    Ok(())
}
