//! Image-to-tensor preprocessing.
//!
//! This module converts an arbitrary-resolution photo into the fixed-size
//! numeric tensor a classification model expects: stretch-resize to the
//! target geometry, decode to an RGBA pixel buffer, then write normalized
//! channel values in row-major, channel-interleaved order.
//!
//! Resizing is delegated to an [`ImageResizer`] collaborator so hosts can
//! plug in platform codecs; the decoded geometry is always re-checked with
//! strict equality, because a mismatched buffer would corrupt every index
//! computation that follows.

use crate::core::errors::ClassifyError;
use crate::core::tensor::{ChannelOrder, InputTensor, TensorSpec};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use tracing::debug;

/// External resizing collaborator.
///
/// Implementations must fill the requested geometry exactly (stretch, not
/// letterbox) and return an RGBA8 buffer in row-major order. An
/// implementation that spills intermediate files owns their cleanup.
pub trait ImageResizer: Send + Sync {
    /// Resizes `image` to exactly `width` x `height`.
    ///
    /// # Errors
    ///
    /// Returns a resize-stage error when the source cannot be resized.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32)
    -> Result<RgbaImage, ClassifyError>;
}

/// Default in-memory resizer with a stretch (non-aspect-preserving) policy.
///
/// The target geometry is always fully filled; distortion is an accepted
/// tradeoff. Creates no temporary files.
#[derive(Debug, Clone, Copy)]
pub struct StretchResizer {
    filter: FilterType,
}

impl StretchResizer {
    /// Creates a resizer with the default Lanczos3 filter.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Creates a resizer with a specific sampling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for StretchResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageResizer for StretchResizer {
    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, ClassifyError> {
        Ok(image.resize_exact(width, height, self.filter).to_rgba8())
    }
}

/// Converts images into normalized model input tensors.
///
/// Stateless and pure over its inputs: nothing is retained between calls,
/// and the returned tensor is owned solely by the caller.
pub struct ImageNormalizer {
    resizer: Box<dyn ImageResizer>,
}

impl std::fmt::Debug for ImageNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageNormalizer").finish_non_exhaustive()
    }
}

impl ImageNormalizer {
    /// Creates a normalizer backed by the default [`StretchResizer`].
    pub fn new() -> Self {
        Self {
            resizer: Box::new(StretchResizer::new()),
        }
    }

    /// Creates a normalizer backed by a custom resizing collaborator.
    pub fn with_resizer(resizer: Box<dyn ImageResizer>) -> Self {
        Self { resizer }
    }

    /// Converts an image into a normalized input tensor.
    ///
    /// The source is resized to `spec.width x spec.height` with a stretch
    /// policy, decoded into a 4-component RGBA buffer, and written out as
    /// a flat `f32` buffer of length `spec.element_count()` where element
    /// `(h, w, c)` lives at `(h * width + w) * channels + c`. Alpha is
    /// always dropped; every value lies within `spec.range`.
    ///
    /// # Arguments
    ///
    /// * `image` - The source image, any resolution and color encoding.
    /// * `spec` - Target geometry and normalization policy.
    ///
    /// # Errors
    ///
    /// * `UnsupportedChannels` - `spec.channels` is not 3.
    /// * `GeometryMismatch` - the resized buffer does not report the
    ///   requested geometry. No tensor is produced.
    /// * A resize-stage `Processing` error when the collaborator fails.
    pub fn normalize(
        &self,
        image: &DynamicImage,
        spec: &TensorSpec,
    ) -> Result<InputTensor, ClassifyError> {
        if spec.channels != 3 {
            return Err(ClassifyError::UnsupportedChannels {
                requested: spec.channels,
            });
        }

        debug!(
            width = spec.width,
            height = spec.height,
            source_width = image.width(),
            source_height = image.height(),
            "resizing image for classification"
        );

        let resized = self.resizer.resize(image, spec.width, spec.height)?;

        let (decoded_width, decoded_height) = resized.dimensions();
        if decoded_width != spec.width || decoded_height != spec.height {
            return Err(ClassifyError::geometry_mismatch(
                (spec.width, spec.height),
                (decoded_width, decoded_height),
            ));
        }

        let width = spec.width as usize;
        let height = spec.height as usize;
        let channels = spec.channels as usize;
        let pixels = resized.as_raw();

        let mut data = vec![0.0f32; spec.element_count()];
        for h in 0..height {
            for w in 0..width {
                let rgba_idx = (h * width + w) * 4;
                for c in 0..channels {
                    // Alpha (component 3) is never read.
                    let component = match spec.order {
                        ChannelOrder::Rgb => c,
                        ChannelOrder::Bgr => 2 - c,
                    };
                    let value = pixels[rgba_idx + component];
                    data[(h * width + w) * channels + c] = spec.range.apply(value);
                }
            }
        }

        debug!(elements = data.len(), "input tensor created");
        Ok(InputTensor::new(
            data,
            spec.width,
            spec.height,
            spec.channels,
        ))
    }

    /// Decodes an image file and converts it into a normalized input tensor.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the source image.
    /// * `spec` - Target geometry and normalization policy.
    ///
    /// # Errors
    ///
    /// `ImageLoad` when the file cannot be decoded, plus everything
    /// [`ImageNormalizer::normalize`] can return.
    pub fn normalize_path(
        &self,
        path: &Path,
        spec: &TensorSpec,
    ) -> Result<InputTensor, ClassifyError> {
        let image = crate::utils::load_image(path)?;
        self.normalize(&image, spec)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::NormalizationRange;
    use image::Rgba;

    fn red_green_image() -> DynamicImage {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        DynamicImage::ImageRgba8(img)
    }

    /// Resizer that reports a geometry different from the requested one.
    struct MisbehavingResizer;

    impl ImageResizer for MisbehavingResizer {
        fn resize(
            &self,
            _image: &DynamicImage,
            _width: u32,
            _height: u32,
        ) -> Result<RgbaImage, ClassifyError> {
            Ok(RgbaImage::new(10, 10))
        }
    }

    fn nearest_normalizer() -> ImageNormalizer {
        // Nearest keeps same-size resizes bit-exact.
        ImageNormalizer::with_resizer(Box::new(StretchResizer::with_filter(FilterType::Nearest)))
    }

    #[test]
    fn test_normalize_worked_example() {
        let normalizer = nearest_normalizer();
        let spec = TensorSpec::unit_rgb(2, 1);

        let tensor = normalizer.normalize(&red_green_image(), &spec).unwrap();
        assert_eq!(tensor.as_slice(), &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normalize_symmetric_range() {
        let normalizer = nearest_normalizer();
        let spec = TensorSpec::mobilenet_rgb(2, 1);

        let tensor = normalizer.normalize(&red_green_image(), &spec).unwrap();
        assert_eq!(tensor.as_slice(), &[1.0, -1.0, -1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_normalize_bgr_order() {
        let normalizer = nearest_normalizer();
        let spec = TensorSpec::unit_rgb(2, 1).with_order(ChannelOrder::Bgr);

        let tensor = normalizer.normalize(&red_green_image(), &spec).unwrap();
        assert_eq!(tensor.as_slice(), &[0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normalize_length_and_bounds() {
        let normalizer = ImageNormalizer::new();
        let mut img = RgbaImage::new(13, 7);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 19 % 256) as u8, (y * 37 % 256) as u8, 128, 255]);
        }
        let source = DynamicImage::ImageRgba8(img);

        for range in [NormalizationRange::ZeroToOne, NormalizationRange::NegOneToOne] {
            let spec = TensorSpec::new(8, 6, 3, ChannelOrder::Rgb, range);
            let tensor = normalizer.normalize(&source, &spec).unwrap();
            assert_eq!(tensor.len(), 8 * 6 * 3);
            assert!(tensor.as_slice().iter().all(|v| range.contains(*v)));
        }
    }

    #[test]
    fn test_normalize_drops_alpha() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        let source = DynamicImage::ImageRgba8(img);

        let normalizer = nearest_normalizer();
        let tensor = normalizer
            .normalize(&source, &TensorSpec::unit_rgb(1, 1))
            .unwrap();
        // Fully transparent alpha must not bleed into the channel values.
        assert_eq!(tensor.len(), 3);
        assert!((tensor.as_slice()[0] - 10.0 / 255.0).abs() < 1e-6);
        assert!((tensor.as_slice()[2] - 30.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_mismatch_produces_no_tensor() {
        let normalizer = ImageNormalizer::with_resizer(Box::new(MisbehavingResizer));
        let err = normalizer
            .normalize(&red_green_image(), &TensorSpec::unit_rgb(2, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::GeometryMismatch {
                expected_width: 2,
                expected_height: 1,
                actual_width: 10,
                actual_height: 10,
            }
        ));
    }

    #[test]
    fn test_unsupported_channel_count() {
        let normalizer = ImageNormalizer::new();
        let spec = TensorSpec::new(
            2,
            1,
            1,
            ChannelOrder::Rgb,
            NormalizationRange::ZeroToOne,
        );
        let err = normalizer.normalize(&red_green_image(), &spec).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::UnsupportedChannels { requested: 1 }
        ));
    }

    #[test]
    fn test_stretch_fills_target_geometry() {
        // A 100x10 source stretched into a square: no letterboxing, the
        // full target is covered.
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            100,
            10,
            Rgba([200, 100, 50, 255]),
        ));
        let normalizer = ImageNormalizer::new();
        let tensor = normalizer
            .normalize(&source, &TensorSpec::unit_rgb(16, 16))
            .unwrap();
        assert_eq!(tensor.len(), 16 * 16 * 3);
        assert_eq!(tensor.width(), 16);
        assert_eq!(tensor.height(), 16);
    }
}
