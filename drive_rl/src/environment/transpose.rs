//! Channel-last to channel-first rewriting of image batches.

use super::vec_env::{SlotInfo, VecStep};
use super::VectorizedEnv;
use crate::core::{ChannelOrder, Image, ImageShape};
use crate::error::{DriveError, Result};

/// Host wrapper that hands the learner channel-first images.
///
/// Every observation coming out of the wrapped host, including terminal
/// observations kept in slot infos, must be a channel-last image of exactly
/// the declared shape. Anything else is rejected with
/// [`DriveError::ShapeMismatch`]; nothing is reshaped or padded.
pub struct VecTransposeImage<V> {
    venv: V,
    shape: ImageShape,
}

impl<V> VecTransposeImage<V>
where
    V: VectorizedEnv<Observation = Image>,
{
    /// Wrap `venv`, declaring the channel-last shape it produces.
    pub fn new(venv: V, shape: ImageShape) -> Self {
        Self { venv, shape }
    }

    /// Declared logical shape.
    pub fn image_shape(&self) -> ImageShape {
        self.shape
    }

    /// Axis sizes seen by the learner: `[channels, height, width]`.
    pub fn observation_dims(&self) -> [usize; 3] {
        self.shape.dims(ChannelOrder::First)
    }

    pub fn inner(&self) -> &V {
        &self.venv
    }

    pub fn inner_mut(&mut self) -> &mut V {
        &mut self.venv
    }

    /// Rewrite one host observation into channel-first order.
    pub fn transpose(&self, image: Image) -> Result<Image> {
        if image.order() != ChannelOrder::Last {
            return Err(DriveError::ShapeMismatch {
                context: "image transpose",
                expected: "channel-last observation".to_string(),
                actual: "channel-first observation".to_string(),
            });
        }
        if image.shape() != self.shape {
            return Err(DriveError::ShapeMismatch {
                context: "image transpose",
                expected: self.shape.to_string(),
                actual: image.shape().to_string(),
            });
        }
        Ok(image.to_order(ChannelOrder::First))
    }

    /// Rewrite a learner-side image back into host order.
    pub fn untranspose(&self, image: &Image) -> Image {
        image.to_order(ChannelOrder::Last)
    }

    fn transpose_batch(&self, batch: Vec<Image>) -> Result<Vec<Image>> {
        batch.into_iter().map(|image| self.transpose(image)).collect()
    }
}

impl<V> VectorizedEnv for VecTransposeImage<V>
where
    V: VectorizedEnv<Observation = Image>,
{
    type Observation = Image;
    type Action = V::Action;

    fn n_envs(&self) -> usize {
        self.venv.n_envs()
    }

    fn reset(&mut self) -> Result<Vec<Image>> {
        let batch = self.venv.reset()?;
        self.transpose_batch(batch)
    }

    fn step(&mut self, actions: &[Self::Action]) -> Result<VecStep<Image>> {
        let VecStep {
            observations,
            rewards,
            dones,
            infos,
        } = self.venv.step(actions)?;

        let observations = self.transpose_batch(observations)?;
        let infos = infos
            .into_iter()
            .map(|slot| {
                let terminal_observation = slot
                    .terminal_observation
                    .map(|image| self.transpose(image))
                    .transpose()?;
                Ok(SlotInfo {
                    terminal_observation,
                    ..slot
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VecStep {
            observations,
            rewards,
            dones,
            infos,
        })
    }

    fn seed(&mut self, seed: u64) {
        self.venv.seed(seed);
    }
}
