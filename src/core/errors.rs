//! Error types for the classification pipeline.
//!
//! This module defines the error types that can occur while preparing an
//! image for inference, running the model, and interpreting its output.
//! Contract violations (geometry mismatch, unsupported channel layouts,
//! output/label shape mismatch) each get their own variant so callers can
//! tell them apart and recover; none of them is fatal to the host
//! application.

use thiserror::Error;

/// Enum representing different stages of processing in the classification pipeline.
///
/// This enum is used to identify which stage of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during pixel normalization.
    Normalization,
    /// Error occurred during output interpretation.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Enum representing the errors that can occur in the classification pipeline.
///
/// Preprocessing failures, inference failures, and interpretation failures
/// are kept distinguishable so the caller can report them and stay usable
/// for a subsequent attempt.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Error occurred while decoding an image.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The decoded image geometry does not match the requested geometry.
    ///
    /// Strict equality is required: a mismatched buffer would corrupt every
    /// subsequent index computation, so no tensor is produced.
    #[error("geometry mismatch: requested {expected_width}x{expected_height}, decoded {actual_width}x{actual_height}")]
    GeometryMismatch {
        /// Requested width in pixels.
        expected_width: u32,
        /// Requested height in pixels.
        expected_height: u32,
        /// Width of the decoded buffer.
        actual_width: u32,
        /// Height of the decoded buffer.
        actual_height: u32,
    },

    /// The requested channel configuration is not implemented.
    ///
    /// Only 3-channel RGB output is defined; anything else is rejected
    /// rather than silently approximated.
    #[error("unsupported channel configuration: {requested} channels (only 3-channel RGB is supported)")]
    UnsupportedChannels {
        /// The number of channels that was requested.
        requested: u32,
    },

    /// The model output length does not match the label catalog length.
    #[error("shape mismatch: {outputs} output values vs {labels} labels")]
    ShapeMismatch {
        /// Number of values in the model output vector.
        outputs: usize,
        /// Number of labels in the catalog.
        labels: usize,
    },

    /// The inference session is missing or failed to load.
    #[error("model unavailable: {reason}")]
    ModelUnavailable {
        /// Why the model cannot be used.
        reason: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

impl ClassifyError {
    /// Creates a ClassifyError for resize operations.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn resize_error(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::Resize,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ClassifyError for normalization operations.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn normalization(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::Normalization,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ClassifyError for post-processing operations.
    ///
    /// # Arguments
    ///
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind: ProcessingStage::PostProcessing,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a ClassifyError for a mismatched decode geometry.
    ///
    /// # Arguments
    ///
    /// * `expected` - The requested (width, height).
    /// * `actual` - The decoded (width, height).
    pub fn geometry_mismatch(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::GeometryMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }

    /// Creates a ClassifyError for an unavailable model.
    ///
    /// # Arguments
    ///
    /// * `reason` - Why the model cannot be used.
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a ClassifyError for invalid input.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a ClassifyError for configuration errors.
    ///
    /// # Arguments
    ///
    /// * `message` - A message describing the configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_mismatch_display() {
        let err = ClassifyError::geometry_mismatch((224, 224), (200, 224));
        let message = err.to_string();
        assert!(message.contains("224x224"));
        assert!(message.contains("200x224"));
    }

    #[test]
    fn test_errors_are_distinguishable() {
        let geometry = ClassifyError::geometry_mismatch((2, 2), (1, 1));
        let channels = ClassifyError::UnsupportedChannels { requested: 4 };
        let shape = ClassifyError::ShapeMismatch {
            outputs: 4,
            labels: 5,
        };

        assert!(matches!(geometry, ClassifyError::GeometryMismatch { .. }));
        assert!(matches!(
            channels,
            ClassifyError::UnsupportedChannels { requested: 4 }
        ));
        assert!(matches!(
            shape,
            ClassifyError::ShapeMismatch {
                outputs: 4,
                labels: 5
            }
        ));
    }
}
