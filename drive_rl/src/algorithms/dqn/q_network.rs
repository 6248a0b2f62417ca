//! Convolutional Q-network for camera observations.
//!
//! Three convolutions (32·8x8/4, 64·4x4/2, 64·3x3/1) followed by a dense
//! feature layer and a linear head producing one Q-value per action.
//! Inputs are channel-first `u8` images scaled to `[0, 1]`.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{ChannelOrder, Image, ImageShape};
use crate::error::{AgentError, DriveError};

/// (out channels, kernel, stride) for each convolution.
const CONV_LAYERS: [(usize, usize, usize); 3] = [(32, 8, 4), (64, 4, 2), (64, 3, 1)];

/// Shape parameters of a [`QNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    pub image: ImageShape,
    pub n_actions: usize,
    pub features_dim: usize,
}

impl QNetworkConfig {
    pub fn new(image: ImageShape, n_actions: usize) -> Self {
        Self {
            image,
            n_actions,
            features_dim: 512,
        }
    }

    pub fn with_features_dim(mut self, features_dim: usize) -> Self {
        self.features_dim = features_dim;
        self
    }

    /// Spatial size after the convolutional stack, or `None` if the image is
    /// too small for the kernels.
    pub fn conv_output(&self) -> Option<(usize, usize)> {
        CONV_LAYERS
            .iter()
            .try_fold((self.image.height, self.image.width), |(h, w), &(_, k, s)| {
                if h < k || w < k {
                    None
                } else {
                    Some(((h - k) / s + 1, (w - k) / s + 1))
                }
            })
    }

    /// Width of the flattened convolutional output.
    pub fn flat_size(&self) -> Option<usize> {
        let (h, w) = self.conv_output()?;
        Some(CONV_LAYERS[2].0 * h * w)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<QNetwork<B>, DriveError> {
        let flat = self.flat_size().ok_or_else(|| DriveError::ShapeMismatch {
            context: "q-network input",
            expected: "images of at least 36x36 pixels".to_string(),
            actual: self.image.to_string(),
        })?;
        if self.n_actions == 0 || self.image.channels == 0 {
            return Err(DriveError::ShapeMismatch {
                context: "q-network input",
                expected: "at least one channel and one action".to_string(),
                actual: format!("{} channels, {} actions", self.image.channels, self.n_actions),
            });
        }

        let [(c1, k1, s1), (c2, k2, s2), (c3, k3, s3)] = CONV_LAYERS;
        Ok(QNetwork {
            conv1: Conv2dConfig::new([self.image.channels, c1], [k1, k1])
                .with_stride([s1, s1])
                .init(device),
            conv2: Conv2dConfig::new([c1, c2], [k2, k2])
                .with_stride([s2, s2])
                .init(device),
            conv3: Conv2dConfig::new([c2, c3], [k3, k3])
                .with_stride([s3, s3])
                .init(device),
            features: LinearConfig::new(flat, self.features_dim).init(device),
            q_head: LinearConfig::new(self.features_dim, self.n_actions).init(device),
            activation: Relu::new(),
        })
    }
}

/// Maps a batch of images to Q-values, one column per action.
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    features: Linear<B>,
    q_head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> QNetwork<B> {
    /// `[batch, channels, height, width]` in `[0, 1]` → `[batch, n_actions]`.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.activation.forward(self.conv3.forward(x));
        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.activation.forward(self.features.forward(x));
        self.q_head.forward(x)
    }

    /// Index of the largest Q-value for every image.
    pub fn greedy(&self, images: Tensor<B, 4>) -> Result<Vec<usize>, AgentError> {
        let actions = self.forward(images).argmax(1);
        let values = actions
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| AgentError::Tensor(format!("{e:?}")))?;
        Ok(values.into_iter().map(|a| a.max(0) as usize).collect())
    }
}

/// Stack channel-first images into a normalized `[batch, c, h, w]` tensor.
pub fn images_to_tensor<'a, B: Backend>(
    images: impl IntoIterator<Item = &'a Image>,
    shape: ImageShape,
    device: &B::Device,
) -> Result<Tensor<B, 4>, AgentError> {
    let mut data = Vec::new();
    let mut count = 0usize;
    for image in images {
        if image.shape() != shape || image.order() != ChannelOrder::First {
            return Err(AgentError::Tensor(format!(
                "expected channel-first {shape} image, got {:?} {}",
                image.order(),
                image.shape()
            )));
        }
        image.extend_normalized(&mut data);
        count += 1;
    }
    if count == 0 {
        return Err(AgentError::EmptyBatch);
    }
    let [c, h, w] = shape.dims(ChannelOrder::First);
    Ok(Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([count, c, h, w]))
}
