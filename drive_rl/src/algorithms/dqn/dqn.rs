//! Deep Q-learning on burn.
//!
//! # Update
//!
//! For a sampled batch of transitions `(s, a, r, s', terminated)`:
//!
//! ```text
//! y    = r + γ · (1 − terminated) · max_a' Q_target(s', a')
//! loss = mean(huber(Q_online(s, a) − y))
//! ```
//!
//! Truncated transitions still bootstrap. The target network lives on the
//! inner (non-autodiff) backend, so no gradient flows through `y`.

use std::path::Path;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::AutodiffBackend;
use tracing::debug;

use super::config::DqnConfig;
use super::q_network::{images_to_tensor, QNetwork, QNetworkConfig};
use crate::algorithms::value_learner::{GreedyPolicy, ValueLearner};
use crate::core::{hard_copy, Image, Transition};
use crate::error::{AgentError, DriveError};

/// Adam with norm clipping, configured from the hyperparameters.
pub fn adam_optimizer<B: AutodiffBackend>(config: &DqnConfig) -> impl Optimizer<QNetwork<B>, B> {
    AdamConfig::new()
        .with_epsilon(config.adam_epsilon)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
        .init()
}

/// Online/target Q-network pair with its optimizer.
pub struct DqnAgent<B: AutodiffBackend, O> {
    online: QNetwork<B>,
    target: QNetwork<B::InnerBackend>,
    optimizer: O,
    network: QNetworkConfig,
    learning_rate: f64,
    gamma: f32,
    device: B::Device,
    n_updates: u64,
}

impl<B, O> DqnAgent<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<QNetwork<B>, B>,
{
    /// Build a fresh agent. The target starts as a copy of the online network.
    pub fn new(
        network: QNetworkConfig,
        config: &DqnConfig,
        optimizer: O,
        device: B::Device,
    ) -> Result<Self, DriveError> {
        let online = network.init::<B>(&device)?;
        let target = hard_copy::<B, _>(&online);
        Ok(Self {
            online,
            target,
            optimizer,
            network,
            learning_rate: config.learning_rate,
            gamma: config.gamma as f32,
            device,
            n_updates: 0,
        })
    }

    pub fn network_config(&self) -> &QNetworkConfig {
        &self.network
    }

    pub fn online(&self) -> &QNetwork<B> {
        &self.online
    }

    /// Inference copy of the online network.
    pub fn policy(&self) -> QPolicy<B::InnerBackend> {
        QPolicy {
            network: self.online.valid(),
            config: self.network,
            device: self.device.clone(),
        }
    }

    /// Q-values of the online network for channel-first observations.
    pub fn q_values(&self, observations: &[Image]) -> Result<Vec<Vec<f32>>, AgentError> {
        let input = images_to_tensor::<B::InnerBackend>(observations, self.network.image, &self.device)?;
        let q = self.online.valid().forward(input);
        let n_actions = self.network.n_actions;
        let flat = q
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| AgentError::Tensor(format!("{e:?}")))?;
        Ok(flat.chunks(n_actions).map(<[f32]>::to_vec).collect())
    }

    fn td_targets(&self, batch: &[Transition]) -> Result<Tensor<B, 1>, AgentError> {
        let n = batch.len();
        let next = images_to_tensor::<B::InnerBackend>(
            batch.iter().map(|t| &t.next_observation),
            self.network.image,
            &self.device,
        )?;
        let next_max = self.target.forward(next).max_dim(1).reshape([n]);

        let rewards: Vec<f32> = batch.iter().map(|t| t.reward).collect();
        let masks: Vec<f32> = batch.iter().map(|t| t.episode_state().bootstrap_mask()).collect();
        let rewards = Tensor::<B::InnerBackend, 1>::from_floats(rewards.as_slice(), &self.device);
        let masks = Tensor::<B::InnerBackend, 1>::from_floats(masks.as_slice(), &self.device);

        let targets = rewards + next_max.mul(masks).mul_scalar(self.gamma);
        Ok(Tensor::from_inner(targets))
    }
}

/// Elementwise Huber loss with unit threshold.
fn huber<B: Backend>(diff: Tensor<B, 1>) -> Tensor<B, 1> {
    let abs = diff.abs();
    let quadratic = abs.clone().clamp_max(1.0);
    quadratic.clone().powf_scalar(2.0).mul_scalar(0.5) + (abs - quadratic)
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> Result<f32, AgentError> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| AgentError::Tensor(format!("{e:?}")))?
        .first()
        .copied()
        .ok_or(AgentError::EmptyBatch)
}

impl<B, O> GreedyPolicy for DqnAgent<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<QNetwork<B>, B>,
{
    fn n_actions(&self) -> usize {
        self.network.n_actions
    }

    fn greedy_actions(&self, observations: &[Image]) -> Result<Vec<usize>, AgentError> {
        let input = images_to_tensor::<B::InnerBackend>(observations, self.network.image, &self.device)?;
        self.online.valid().greedy(input)
    }
}

impl<B, O> ValueLearner for DqnAgent<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<QNetwork<B>, B>,
{
    fn train_step(&mut self, batch: &[Transition]) -> Result<f32, AgentError> {
        if batch.is_empty() {
            return Err(AgentError::EmptyBatch);
        }
        let n = batch.len();
        let targets = self.td_targets(batch)?;

        let observations = images_to_tensor::<B>(
            batch.iter().map(|t| &t.observation),
            self.network.image,
            &self.device,
        )?;
        let actions: Vec<i32> = batch.iter().map(|t| t.action as i32).collect();
        let actions = Tensor::<B, 1, Int>::from_ints(actions.as_slice(), &self.device).reshape([n, 1]);

        let q_taken = self.online.forward(observations).gather(1, actions).reshape([n]);
        let loss = huber(q_taken - targets).mean();
        let loss_value = scalar(loss.clone())?;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.online);
        self.online = self
            .optimizer
            .step(self.learning_rate, self.online.clone(), grads);
        self.n_updates += 1;

        Ok(loss_value)
    }

    fn sync_target(&mut self) {
        self.target = hard_copy::<B, _>(&self.online);
        debug!(n_updates = self.n_updates, "target network synced");
    }

    fn save(&self, path: &Path) -> Result<(), AgentError> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        self.online
            .clone()
            .save_file(path.to_path_buf(), &recorder)
            .map_err(|e| AgentError::Record(e.to_string()))
    }

    fn n_updates(&self) -> u64 {
        self.n_updates
    }
}

/// A trained Q-network used only for greedy control.
#[derive(Debug)]
pub struct QPolicy<B: Backend> {
    network: QNetwork<B>,
    config: QNetworkConfig,
    device: B::Device,
}

impl<B: Backend> QPolicy<B> {
    /// Load parameters written by [`ValueLearner::save`].
    pub fn load(path: &Path, config: QNetworkConfig, device: B::Device) -> Result<Self, DriveError> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        let network = config
            .init::<B>(&device)?
            .load_file(path.to_path_buf(), &recorder, &device)
            .map_err(|e| AgentError::Record(e.to_string()))?;
        Ok(Self {
            network,
            config,
            device,
        })
    }

    pub fn config(&self) -> &QNetworkConfig {
        &self.config
    }
}

impl<B: Backend> GreedyPolicy for QPolicy<B> {
    fn n_actions(&self) -> usize {
        self.config.n_actions
    }

    fn greedy_actions(&self, observations: &[Image]) -> Result<Vec<usize>, AgentError> {
        let input = images_to_tensor::<B>(observations, self.config.image, &self.device)?;
        self.network.greedy(input)
    }
}
