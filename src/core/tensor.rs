//! Tensor types for model input and output.
//!
//! This module defines the target geometry and normalization policy for
//! preprocessed images ([`TensorSpec`]), the flat pixel tensor produced by
//! the normalizer ([`InputTensor`]), and the ndarray aliases used at the
//! inference boundary.

use crate::core::errors::ClassifyError;
use serde::{Deserialize, Serialize};

/// A 4D tensor (batch, height, width, channels) as consumed by classification models.
pub type Tensor4D = ndarray::Array4<f32>;

/// The numeric range pixel intensities are normalized into.
///
/// The formula is a configuration parameter rather than a hard-coded
/// constant: different models expect different ranges, and mis-normalizing
/// silently degrades every prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationRange {
    /// `value / 255.0`, producing values in `[0, 1]`.
    #[default]
    ZeroToOne,
    /// `value / 127.5 - 1.0`, producing values in `[-1, 1]` (MobileNet convention).
    NegOneToOne,
}

impl NormalizationRange {
    /// Normalizes a single 8-bit channel value into this range.
    pub fn apply(&self, value: u8) -> f32 {
        match self {
            NormalizationRange::ZeroToOne => value as f32 / 255.0,
            NormalizationRange::NegOneToOne => value as f32 / 127.5 - 1.0,
        }
    }

    /// Returns the inclusive (low, high) bounds of this range.
    pub fn bounds(&self) -> (f32, f32) {
        match self {
            NormalizationRange::ZeroToOne => (0.0, 1.0),
            NormalizationRange::NegOneToOne => (-1.0, 1.0),
        }
    }

    /// Checks whether a value lies within this range.
    pub fn contains(&self, value: f32) -> bool {
        let (low, high) = self.bounds();
        value >= low && value <= high
    }
}

/// Color channel order of the interleaved output tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Red, green, blue (the common convention for image classifiers).
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// Target geometry and normalization policy for a model input tensor.
///
/// Immutable, supplied per invocation, and typically derived from the
/// model's declared input shape via [`TensorSpec::from_input_shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorSpec {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Number of output channels. Only 3 (RGB) is supported.
    pub channels: u32,
    /// Color channel order of the interleaved output.
    pub order: ChannelOrder,
    /// Normalization range applied to every channel value.
    pub range: NormalizationRange,
}

impl TensorSpec {
    /// Creates a new TensorSpec with the given geometry and policies.
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        order: ChannelOrder,
        range: NormalizationRange,
    ) -> Self {
        Self {
            width,
            height,
            channels,
            order,
            range,
        }
    }

    /// RGB spec normalized into `[0, 1]`.
    pub fn unit_rgb(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            3,
            ChannelOrder::Rgb,
            NormalizationRange::ZeroToOne,
        )
    }

    /// RGB spec normalized into `[-1, 1]`, the MobileNet convention.
    pub fn mobilenet_rgb(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            3,
            ChannelOrder::Rgb,
            NormalizationRange::NegOneToOne,
        )
    }

    /// Returns the same spec with a different channel order.
    pub fn with_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    /// Total number of elements in a tensor with this geometry.
    pub fn element_count(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    /// Derives a TensorSpec from a model's declared BHWC input shape.
    ///
    /// The shape must be 4-dimensional `[batch, height, width, channels]`
    /// with a static channel dimension of exactly 3. A dynamic (negative)
    /// or unsupported channel dimension is rejected before any
    /// preprocessing happens, so no tensor is ever built for a model the
    /// normalizer cannot feed.
    ///
    /// # Arguments
    ///
    /// * `shape` - The declared input shape, dynamic dimensions as negatives.
    /// * `range` - The normalization range the model was trained with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for non-4D shapes or non-positive spatial
    /// dimensions, and `UnsupportedChannels` when the channel dimension is
    /// dynamic or not 3.
    pub fn from_input_shape(shape: &[i64], range: NormalizationRange) -> Result<Self, ClassifyError> {
        if shape.len() != 4 {
            return Err(ClassifyError::invalid_input(format!(
                "expected a 4D BHWC input shape, got {}D: {:?}",
                shape.len(),
                shape
            )));
        }

        let channels = shape[3];
        if channels != 3 {
            // Dynamic channel dims show up as negatives; both cases mean
            // the normalizer cannot produce a matching buffer.
            return Err(ClassifyError::UnsupportedChannels {
                requested: channels.max(0) as u32,
            });
        }

        let (height, width) = (shape[1], shape[2]);
        if height <= 0 || width <= 0 {
            return Err(ClassifyError::invalid_input(format!(
                "model input geometry must be static and positive, got {}x{}",
                height, width
            )));
        }

        Ok(Self::new(
            width as u32,
            height as u32,
            3,
            ChannelOrder::Rgb,
            range,
        ))
    }
}

/// A fixed-length pixel tensor in row-major, channel-interleaved order.
///
/// Produced fresh per classification call and never mutated afterwards.
/// Element `(h, w, c)` lives at index `(h * width + w) * channels + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u32,
}

impl InputTensor {
    pub(crate) fn new(data: Vec<f32>, width: u32, height: u32, channels: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * channels) as usize);
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// The flat numeric buffer in HWC order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Tensor width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tensor height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of channels.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Wraps the tensor in a single-element batch shaped `[1, H, W, C]`
    /// for the inference engine.
    pub fn into_batch(self) -> Result<Tensor4D, ClassifyError> {
        let shape = (
            1,
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        );
        Ok(ndarray::Array4::from_shape_vec(shape, self.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_formulas() {
        assert_eq!(NormalizationRange::ZeroToOne.apply(0), 0.0);
        assert_eq!(NormalizationRange::ZeroToOne.apply(255), 1.0);
        assert_eq!(NormalizationRange::NegOneToOne.apply(0), -1.0);
        assert_eq!(NormalizationRange::NegOneToOne.apply(255), 1.0);
        assert!((NormalizationRange::NegOneToOne.apply(127) - -0.003_921_6).abs() < 1e-4);
    }

    #[test]
    fn test_from_input_shape_accepts_bhwc() {
        let spec =
            TensorSpec::from_input_shape(&[1, 224, 224, 3], NormalizationRange::NegOneToOne)
                .unwrap();
        assert_eq!(spec.width, 224);
        assert_eq!(spec.height, 224);
        assert_eq!(spec.channels, 3);
        assert_eq!(spec.element_count(), 224 * 224 * 3);
    }

    #[test]
    fn test_from_input_shape_rejects_bad_channels() {
        let err = TensorSpec::from_input_shape(&[1, 224, 224, 1], NormalizationRange::ZeroToOne)
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::UnsupportedChannels { requested: 1 }
        ));

        // A dynamic channel dimension is just as unusable.
        let err = TensorSpec::from_input_shape(&[1, 224, 224, -1], NormalizationRange::ZeroToOne)
            .unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedChannels { .. }));
    }

    #[test]
    fn test_from_input_shape_rejects_non_4d() {
        let err =
            TensorSpec::from_input_shape(&[1, 1000], NormalizationRange::ZeroToOne).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidInput { .. }));

        let err = TensorSpec::from_input_shape(&[1, -1, 224, 3], NormalizationRange::ZeroToOne)
            .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidInput { .. }));
    }

    #[test]
    fn test_into_batch_shape() {
        let tensor = InputTensor::new(vec![0.0; 2 * 3 * 3], 3, 2, 3);
        let batch = tensor.into_batch().unwrap();
        assert_eq!(batch.shape(), &[1, 2, 3, 3]);
    }
}
