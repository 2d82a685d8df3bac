//! End-to-end classification pipeline.
//!
//! [`FruitClassifier`] ties the pieces together: decode an image, build
//! the model input tensor, run inference, and interpret the output vector
//! against the label catalog. Each call is one logical operation with no
//! state carried between calls; a failed attempt leaves the classifier
//! fully usable for the next one.

use crate::core::config::ClassifierConfig;
use crate::core::errors::ClassifyError;
use crate::core::inference::ModelSession;
use crate::core::tensor::{ChannelOrder, NormalizationRange, TensorSpec};
use crate::domain::labels::{fruit_catalog, LabelCatalog};
use crate::processors::interpret::{Classification, OutputInterpreter, ScorePolicy};
use crate::processors::normalize::{ImageNormalizer, ImageResizer, StretchResizer};
use image::imageops::FilterType;
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

/// Batches larger than this are classified in parallel.
const PARALLEL_THRESHOLD: usize = 4;

/// An image classifier backed by an ONNX model.
///
/// The input geometry is introspected from the model at build time and
/// translated into a [`TensorSpec`]; models whose channel dimension is
/// undefined or unsupported are rejected before anything is preprocessed.
#[derive(Debug)]
pub struct FruitClassifier {
    session: ModelSession,
    spec: TensorSpec,
    normalizer: ImageNormalizer,
    interpreter: OutputInterpreter,
    catalog: LabelCatalog,
    top_k: usize,
    min_confidence: Option<f32>,
}

impl FruitClassifier {
    /// Creates a builder for configuring a classifier.
    pub fn builder() -> FruitClassifierBuilder {
        FruitClassifierBuilder::new()
    }

    /// Loads a classifier with default settings and the built-in fruit
    /// catalog.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the ONNX model file.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        Self::builder().model_path(model_path.as_ref()).build()
    }

    /// Builds a classifier from a validated configuration.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, catalog loading errors, and
    /// everything [`FruitClassifierBuilder::build`] can return.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        config.validate()?;

        let mut catalog = if let Some(path) = &config.labels_path {
            let text = std::fs::read_to_string(path)?;
            LabelCatalog::from_lines(&text)
        } else if let Some(labels) = &config.labels {
            LabelCatalog::from_labels(labels.iter().cloned())
        } else {
            fruit_catalog()
        };
        for (label, text) in &config.descriptions {
            catalog.add_description(label.clone(), text.clone());
        }

        let mut builder = Self::builder()
            .model_path(&config.model_path)
            .catalog(catalog)
            .score_policy(config.score_policy)
            .normalization(config.normalization)
            .channel_order(config.channel_order);
        if let Some(top_k) = config.top_k {
            builder = builder.top_k(top_k);
        }
        if let Some(min_confidence) = config.min_confidence {
            builder = builder.min_confidence(min_confidence);
        }
        builder.build()
    }

    /// The tensor spec derived from the model's declared input shape.
    pub fn spec(&self) -> &TensorSpec {
        &self.spec
    }

    /// The label catalog this classifier resolves against.
    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// Classifies an image file.
    ///
    /// One logical operation: decode, normalize, infer, interpret. The
    /// returned result is owned by the caller; nothing is retained.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the image to classify.
    ///
    /// # Errors
    ///
    /// Any preprocessing, inference, or interpretation error; all are
    /// recoverable and the classifier stays usable.
    pub fn classify(&self, path: &Path) -> Result<Classification, ClassifyError> {
        let image = crate::utils::load_image(path)?;
        self.classify_image(&image)
    }

    /// Classifies an already-decoded image.
    pub fn classify_image(&self, image: &DynamicImage) -> Result<Classification, ClassifyError> {
        let tensor = self.normalizer.normalize(image, &self.spec)?;
        let batch = tensor.into_batch()?;
        let output = self.session.run(&batch)?;
        self.interpreter.interpret(&output, &self.catalog)
    }

    /// Classifies an image file and returns the ranked top results.
    ///
    /// Uses the configured `top_k` and `min_confidence`.
    pub fn classify_top_k(&self, path: &Path) -> Result<Vec<Classification>, ClassifyError> {
        let image = crate::utils::load_image(path)?;
        let tensor = self.normalizer.normalize(&image, &self.spec)?;
        let batch = tensor.into_batch()?;
        let output = self.session.run(&batch)?;
        self.interpreter
            .top_k(&output, &self.catalog, self.top_k, self.min_confidence)
    }

    /// Classifies a batch of image files, one result per input.
    ///
    /// Individual failures do not poison the batch. Larger batches are
    /// processed in parallel.
    pub fn classify_batch<P>(&self, paths: &[P]) -> Vec<Result<Classification, ClassifyError>>
    where
        P: AsRef<Path> + Send + Sync,
    {
        debug!(count = paths.len(), "classifying batch");
        if paths.len() > PARALLEL_THRESHOLD {
            paths
                .par_iter()
                .map(|path| self.classify(path.as_ref()))
                .collect()
        } else {
            paths.iter().map(|path| self.classify(path.as_ref())).collect()
        }
    }
}

/// Builder for [`FruitClassifier`].
pub struct FruitClassifierBuilder {
    model_path: Option<std::path::PathBuf>,
    catalog: Option<LabelCatalog>,
    score_policy: ScorePolicy,
    normalization: NormalizationRange,
    channel_order: ChannelOrder,
    resizer: Option<Box<dyn ImageResizer>>,
    resize_filter: FilterType,
    top_k: usize,
    min_confidence: Option<f32>,
}

impl FruitClassifierBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            model_path: None,
            catalog: None,
            score_policy: ScorePolicy::default(),
            normalization: NormalizationRange::default(),
            channel_order: ChannelOrder::default(),
            resizer: None,
            resize_filter: FilterType::Lanczos3,
            top_k: 3,
            min_confidence: None,
        }
    }

    /// Sets the path to the ONNX model file.
    pub fn model_path(mut self, model_path: impl Into<std::path::PathBuf>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }

    /// Sets the label catalog. Defaults to the built-in fruit catalog.
    pub fn catalog(mut self, catalog: LabelCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Declares whether the model output is already normalized.
    pub fn score_policy(mut self, policy: ScorePolicy) -> Self {
        self.score_policy = policy;
        self
    }

    /// Sets the normalization range the model was trained with.
    pub fn normalization(mut self, range: NormalizationRange) -> Self {
        self.normalization = range;
        self
    }

    /// Sets the color channel order of the model input.
    pub fn channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// Replaces the resizing collaborator.
    pub fn resizer(mut self, resizer: Box<dyn ImageResizer>) -> Self {
        self.resizer = Some(resizer);
        self
    }

    /// Sets the sampling filter for the default resizer.
    pub fn resize_filter(mut self, filter: FilterType) -> Self {
        self.resize_filter = filter;
        self
    }

    /// Sets how many ranked results `classify_top_k` returns.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the confidence floor for `classify_top_k`.
    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    /// Builds the classifier: loads the model, derives the input spec
    /// from its declared shape, and wires up the pipeline.
    ///
    /// # Errors
    ///
    /// * `ModelUnavailable` - no model path was configured or the session
    ///   cannot be created.
    /// * `UnsupportedChannels` / `InvalidInput` - the model input shape is
    ///   not a static 3-channel BHWC shape.
    /// * `ConfigError` - `top_k` is 0 or the catalog is empty.
    pub fn build(self) -> Result<FruitClassifier, ClassifyError> {
        let model_path = self
            .model_path
            .ok_or_else(|| ClassifyError::model_unavailable("no model path configured"))?;

        if self.top_k == 0 {
            return Err(ClassifyError::config_error("top_k must be greater than 0"));
        }

        let catalog = self.catalog.unwrap_or_else(fruit_catalog);
        if catalog.is_empty() {
            return Err(ClassifyError::config_error("label catalog is empty"));
        }

        let session = ModelSession::load(&model_path)?;
        let spec = session
            .input_spec(self.normalization)?
            .with_order(self.channel_order);

        debug!(
            model = %session.model_name(),
            width = spec.width,
            height = spec.height,
            labels = catalog.len(),
            "classifier ready"
        );

        let normalizer = match self.resizer {
            Some(resizer) => ImageNormalizer::with_resizer(resizer),
            None => ImageNormalizer::with_resizer(Box::new(StretchResizer::with_filter(
                self.resize_filter,
            ))),
        };

        Ok(FruitClassifier {
            session,
            spec,
            normalizer,
            interpreter: OutputInterpreter::with_policy(self.score_policy),
            catalog,
            top_k: self.top_k,
            min_confidence: self.min_confidence,
        })
    }
}

impl Default for FruitClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_model_path() {
        let err = FruitClassifier::builder().build().unwrap_err();
        assert!(matches!(err, ClassifyError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_build_with_missing_model_file() {
        let err = FruitClassifier::builder()
            .model_path("definitely/not/a/model.onnx")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifyError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_build_rejects_zero_top_k() {
        let err = FruitClassifier::builder()
            .model_path("model.onnx")
            .top_k(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifyError::ConfigError { .. }));
    }

    #[test]
    fn test_build_rejects_empty_catalog() {
        let err = FruitClassifier::builder()
            .model_path("model.onnx")
            .catalog(LabelCatalog::from_labels(Vec::<String>::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifyError::ConfigError { .. }));
    }
}
