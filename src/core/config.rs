//! Classifier configuration.
//!
//! Serde-backed configuration for building a classifier from a file or
//! embedded JSON, with validation before anything is loaded.

use crate::core::errors::ClassifyError;
use crate::core::tensor::{ChannelOrder, NormalizationRange};
use crate::processors::interpret::ScorePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration for a [`FruitClassifier`](crate::pipeline::FruitClassifier).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path to the ONNX model file.
    pub model_path: PathBuf,
    /// Path to a newline-separated labels file.
    ///
    /// Mutually exclusive with `labels`; when neither is set, the built-in
    /// fruit catalog is used.
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    /// Inline ordered labels.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// Descriptions keyed by label, attached to whichever catalog is used.
    #[serde(default)]
    pub descriptions: HashMap<String, String>,
    /// Whether the model output is already a probability distribution.
    #[serde(default)]
    pub score_policy: ScorePolicy,
    /// Normalization range the model was trained with.
    #[serde(default)]
    pub normalization: NormalizationRange,
    /// Color channel order of the model input.
    #[serde(default)]
    pub channel_order: ChannelOrder,
    /// Number of ranked results for top-k classification.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Confidence floor for top-k results.
    #[serde(default)]
    pub min_confidence: Option<f32>,
}

impl ClassifierConfig {
    /// Creates a configuration for a model path with defaults everywhere
    /// else.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the JSON does not parse.
    pub fn from_json(json: &str) -> Result<Self, ClassifyError> {
        serde_json::from_str(json)
            .map_err(|e| ClassifyError::config_error(format!("invalid classifier config: {e}")))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the model path is empty, both label sources are
    /// set at once, `top_k` is 0, or `min_confidence` falls outside
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ClassifyError::config_error("model_path must not be empty"));
        }

        if self.labels_path.is_some() && self.labels.is_some() {
            return Err(ClassifyError::config_error(
                "labels_path and labels are mutually exclusive",
            ));
        }

        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                return Err(ClassifyError::config_error("top_k must be greater than 0"));
            }
        }

        if let Some(min_confidence) = self.min_confidence {
            if !(0.0..=1.0).contains(&min_confidence) {
                return Err(ClassifyError::config_error(format!(
                    "min_confidence must be within [0, 1], got {min_confidence}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ClassifierConfig::new("models/fruit.onnx");
        assert!(config.validate().is_ok());
        assert_eq!(config.score_policy, ScorePolicy::Auto);
        assert_eq!(config.normalization, NormalizationRange::ZeroToOne);
    }

    #[test]
    fn test_empty_model_path_rejected() {
        let config = ClassifierConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ClassifyError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_conflicting_label_sources_rejected() {
        let config = ClassifierConfig {
            labels_path: Some("labels.txt".into()),
            labels: Some(vec!["apple".into()]),
            ..ClassifierConfig::new("model.onnx")
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounds_checks() {
        let zero_k = ClassifierConfig {
            top_k: Some(0),
            ..ClassifierConfig::new("model.onnx")
        };
        assert!(zero_k.validate().is_err());

        let bad_floor = ClassifierConfig {
            min_confidence: Some(1.5),
            ..ClassifierConfig::new("model.onnx")
        };
        assert!(bad_floor.validate().is_err());
    }

    #[test]
    fn test_from_json_round_trip() {
        let config = ClassifierConfig::from_json(
            r#"{
                "model_path": "models/fruit.onnx",
                "labels": ["apple", "banana"],
                "score_policy": "logits",
                "normalization": "neg_one_to_one",
                "top_k": 3,
                "min_confidence": 0.2
            }"#,
        )
        .unwrap();
        assert_eq!(config.score_policy, ScorePolicy::Logits);
        assert_eq!(config.normalization, NormalizationRange::NegOneToOne);
        assert_eq!(config.top_k, Some(3));
        assert!(config.validate().is_ok());
    }
}
