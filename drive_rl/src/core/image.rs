//! Camera image observations.
//!
//! Images are stored as flat `u8` buffers together with their logical shape
//! (height, width, channels) and the order in which the axes are laid out in
//! memory. Simulators produce channel-last (HWC) images; convolutional feature
//! extractors consume channel-first (CHW) tensors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DriveError;

/// Memory layout of the channel axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Height x Width x Channel.
    Last,
    /// Channel x Height x Width.
    First,
}

impl ChannelOrder {
    /// The other layout.
    pub fn flipped(self) -> Self {
        match self {
            Self::Last => Self::First,
            Self::First => Self::Last,
        }
    }
}

/// Logical image dimensions, independent of memory layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of elements in one image.
    pub fn len(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Axis sizes in memory order for the given layout.
    pub fn dims(&self, order: ChannelOrder) -> [usize; 3] {
        match order {
            ChannelOrder::Last => [self.height, self.width, self.channels],
            ChannelOrder::First => [self.channels, self.height, self.width],
        }
    }
}

impl fmt::Display for ImageShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{} (HxWxC)", self.height, self.width, self.channels)
    }
}

/// A single camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    shape: ImageShape,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl Image {
    /// Create an image, checking that the buffer length matches the shape.
    pub fn new(shape: ImageShape, order: ChannelOrder, data: Vec<u8>) -> Result<Self, DriveError> {
        if data.len() != shape.len() {
            return Err(DriveError::ShapeMismatch {
                context: "image buffer",
                expected: format!("{} elements for {}", shape.len(), shape),
                actual: format!("{} elements", data.len()),
            });
        }
        Ok(Self { shape, order, data })
    }

    /// Black image of the given shape.
    pub fn zeros(shape: ImageShape, order: ChannelOrder) -> Self {
        Self {
            shape,
            order,
            data: vec![0; shape.len()],
        }
    }

    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Axis sizes in memory order.
    pub fn dims(&self) -> [usize; 3] {
        self.shape.dims(self.order)
    }

    #[inline]
    fn offset(&self, row: usize, col: usize, channel: usize) -> usize {
        let ImageShape {
            height,
            width,
            channels,
        } = self.shape;
        match self.order {
            ChannelOrder::Last => (row * width + col) * channels + channel,
            ChannelOrder::First => channel * height * width + row * width + col,
        }
    }

    /// Pixel value at logical coordinates, regardless of layout.
    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.data[self.offset(row, col, channel)]
    }

    /// Set a pixel at logical coordinates.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: u8) {
        let idx = self.offset(row, col, channel);
        self.data[idx] = value;
    }

    /// Copy of this image laid out in `order`.
    pub fn to_order(&self, order: ChannelOrder) -> Image {
        if order == self.order {
            return self.clone();
        }
        let mut out = Image::zeros(self.shape, order);
        for row in 0..self.shape.height {
            for col in 0..self.shape.width {
                for channel in 0..self.shape.channels {
                    out.set(row, col, channel, self.get(row, col, channel));
                }
            }
        }
        out
    }

    /// Append pixels scaled to `[0, 1]` in memory order.
    pub fn extend_normalized(&self, out: &mut Vec<f32>) {
        out.extend(self.data.iter().map(|&p| p as f32 / 255.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(shape: ImageShape) -> Image {
        let data = (0..shape.len()).map(|i| (i % 251) as u8).collect();
        Image::new(shape, ChannelOrder::Last, data).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = Image::new(ImageShape::new(2, 2, 1), ChannelOrder::Last, vec![0; 3]).unwrap_err();
        assert!(matches!(err, DriveError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_dims_follow_order() {
        let shape = ImageShape::new(84, 84, 1);
        assert_eq!(shape.dims(ChannelOrder::Last), [84, 84, 1]);
        assert_eq!(shape.dims(ChannelOrder::First), [1, 84, 84]);
    }

    #[test]
    fn test_to_order_preserves_pixels() {
        let hwc = gradient(ImageShape::new(3, 4, 2));
        let chw = hwc.to_order(ChannelOrder::First);

        assert_eq!(chw.order(), ChannelOrder::First);
        for row in 0..3 {
            for col in 0..4 {
                for ch in 0..2 {
                    assert_eq!(hwc.get(row, col, ch), chw.get(row, col, ch));
                }
            }
        }
        // Channel 0 plane comes first in CHW memory.
        assert_eq!(chw.data()[0], hwc.data()[0]);
        assert_eq!(chw.data()[1], hwc.data()[2]);
    }

    #[test]
    fn test_extend_normalized() {
        let img = Image::new(ImageShape::new(1, 2, 1), ChannelOrder::Last, vec![0, 255]).unwrap();
        let mut out = Vec::new();
        img.extend_normalized(&mut out);
        assert_eq!(out, vec![0.0, 1.0]);
    }
}
