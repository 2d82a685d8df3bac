//! Model output interpretation.
//!
//! This module turns the raw numeric vector produced by an inference call
//! into a human-facing classification: decide whether the vector still
//! needs softmax, pick the top-scoring label, and attach its description.

use crate::core::errors::ClassifyError;
use crate::domain::labels::LabelCatalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How far a probability sum may drift from 1.0 before the vector is
/// treated as raw logits under [`ScorePolicy::Auto`].
const PROBABILITY_SUM_TOLERANCE: f32 = 0.1;

/// Converts a vector of scores into a probability distribution.
///
/// The maximum element is subtracted before exponentiating so large
/// positive logits cannot overflow. If the sum of exponentials is not a
/// positive finite number (degenerate input, e.g. all `-inf`), the uniform
/// distribution `1/len` is returned instead of dividing by zero.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }

    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum <= 0.0 || !sum.is_finite() {
        return vec![1.0 / values.len() as f32; values.len()];
    }

    exps.into_iter().map(|e| e / sum).collect()
}

/// Declares whether a model's output vector is already a probability
/// distribution.
///
/// Callers that know their model should say so with `Probabilities` or
/// `Logits`; `Auto` falls back to a sum-near-1.0 heuristic, which can
/// misjudge a genuine distribution whose sum drifts past the tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicy {
    /// Apply softmax iff the output sum deviates from 1.0 by more than 0.1.
    #[default]
    Auto,
    /// The output is already normalized; pass it through unchanged.
    Probabilities,
    /// The output is raw scores; always apply softmax.
    Logits,
}

/// A single classification outcome.
///
/// Immutable once constructed; lifetime is caller-controlled.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The winning label.
    pub label: Arc<str>,
    /// Probability assigned to the winning label, in `[0, 1]`.
    pub confidence: f32,
    /// Description for the label, when the catalog has one.
    pub description: Option<Arc<str>>,
}

/// Interprets raw model output vectors against a label catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputInterpreter {
    policy: ScorePolicy,
}

impl OutputInterpreter {
    /// Creates an interpreter with the default [`ScorePolicy::Auto`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interpreter with an explicit score policy.
    pub fn with_policy(policy: ScorePolicy) -> Self {
        Self { policy }
    }

    /// The configured score policy.
    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    /// Resolves the output vector into a probability distribution
    /// according to the configured policy.
    fn resolve_probabilities(&self, output: &[f32]) -> Vec<f32> {
        let needs_softmax = match self.policy {
            ScorePolicy::Probabilities => false,
            ScorePolicy::Logits => true,
            ScorePolicy::Auto => {
                let sum: f32 = output.iter().sum();
                (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE
            }
        };

        debug!(
            policy = ?self.policy,
            needs_softmax,
            "resolving output scores"
        );

        if needs_softmax {
            softmax(output)
        } else {
            output.to_vec()
        }
    }

    /// Picks the top-scoring label for a model output vector.
    ///
    /// The resolved probability vector is scanned once, tracking the
    /// running maximum; ties resolve to the lowest index. An all-zero
    /// output therefore yields the uniform fallback with the catalog's
    /// first label at confidence `1/len`.
    ///
    /// # Arguments
    ///
    /// * `output` - Raw output vector from the inference engine, read-only.
    /// * `labels` - Catalog whose index positions match the output vector.
    ///
    /// # Errors
    ///
    /// * `ShapeMismatch` - output length differs from catalog length. The
    ///   result is invalid and is never silently truncated.
    /// * `InvalidInput` - the catalog is empty.
    pub fn interpret(
        &self,
        output: &[f32],
        labels: &LabelCatalog,
    ) -> Result<Classification, ClassifyError> {
        if output.len() != labels.len() {
            return Err(ClassifyError::ShapeMismatch {
                outputs: output.len(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(ClassifyError::invalid_input(
                "cannot classify against an empty label catalog",
            ));
        }

        let probabilities = self.resolve_probabilities(output);

        let mut best_index = 0;
        let mut best_value = f32::NEG_INFINITY;
        for (index, &value) in probabilities.iter().enumerate() {
            if value > best_value {
                best_value = value;
                best_index = index;
            }
        }

        // len > 0 was checked above, so the index is always resolvable.
        let label = labels
            .get(best_index)
            .cloned()
            .ok_or_else(|| ClassifyError::invalid_input("best index out of catalog bounds"))?;

        Ok(Classification {
            description: labels.description(&label).cloned(),
            label,
            confidence: best_value,
        })
    }

    /// Returns the `k` highest-confidence classifications in descending
    /// order, optionally filtered by a confidence floor.
    ///
    /// `k` is clamped to the catalog length. Ordering ties resolve to the
    /// lowest index, matching [`OutputInterpreter::interpret`].
    ///
    /// # Arguments
    ///
    /// * `output` - Raw output vector from the inference engine.
    /// * `labels` - Catalog whose index positions match the output vector.
    /// * `k` - Number of results to return; must be greater than 0.
    /// * `min_confidence` - Drop results below this probability.
    ///
    /// # Errors
    ///
    /// Everything [`OutputInterpreter::interpret`] can return, plus
    /// `InvalidInput` when `k` is 0.
    pub fn top_k(
        &self,
        output: &[f32],
        labels: &LabelCatalog,
        k: usize,
        min_confidence: Option<f32>,
    ) -> Result<Vec<Classification>, ClassifyError> {
        if k == 0 {
            return Err(ClassifyError::invalid_input("k must be greater than 0"));
        }
        if output.len() != labels.len() {
            return Err(ClassifyError::ShapeMismatch {
                outputs: output.len(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(ClassifyError::invalid_input(
                "cannot classify against an empty label catalog",
            ));
        }

        let probabilities = self.resolve_probabilities(output);

        let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
        indexed.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let floor = min_confidence.unwrap_or(0.0);
        let results = indexed
            .into_iter()
            .take(k.min(labels.len()))
            .filter(|(_, confidence)| *confidence >= floor)
            .filter_map(|(index, confidence)| {
                labels.get(index).cloned().map(|label| Classification {
                    description: labels.description(&label).cloned(),
                    label,
                    confidence,
                })
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> LabelCatalog {
        LabelCatalog::from_labels((0..n).map(|i| format!("class-{i}")))
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probabilities = softmax(&[3.0, 1.0, 0.2]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probabilities[0] > probabilities[1]);
        assert!(probabilities[1] > probabilities[2]);
    }

    #[test]
    fn test_softmax_shift_invariance() {
        let base = softmax(&[1.0, 2.0, 3.0]);
        let shifted = softmax(&[101.0, 102.0, 103.0]);
        for (a, b) in base.iter().zip(&shifted) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let probabilities = softmax(&[1000.0, 999.0, 998.0]);
        assert!(probabilities.iter().all(|p| p.is_finite()));
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_degenerate_input_is_uniform() {
        let probabilities = softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY]);
        assert_eq!(probabilities, vec![0.5, 0.5]);
    }

    #[test]
    fn test_interpret_passes_through_normalized_output() {
        let interpreter = OutputInterpreter::new();
        let output = [0.1, 0.7, 0.2];
        let result = interpreter.interpret(&output, &catalog(3)).unwrap();
        assert_eq!(&*result.label, "class-1");
        // Sum is 1.0, so the values must arrive unchanged.
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_interpret_applies_softmax_to_logits() {
        let interpreter = OutputInterpreter::new();
        let output = [2.0, 8.0, 1.0];
        let result = interpreter.interpret(&output, &catalog(3)).unwrap();
        assert_eq!(&*result.label, "class-1");
        assert!(result.confidence > 0.99 && result.confidence <= 1.0);
    }

    #[test]
    fn test_interpret_all_zero_output_is_uniform() {
        let interpreter = OutputInterpreter::new();
        let labels = catalog(4);
        let result = interpreter.interpret(&[0.0; 4], &labels).unwrap();
        assert_eq!(&*result.label, "class-0");
        assert!((result.confidence - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_interpret_ties_resolve_to_first_index() {
        let interpreter = OutputInterpreter::with_policy(ScorePolicy::Probabilities);
        let result = interpreter.interpret(&[0.4, 0.4, 0.2], &catalog(3)).unwrap();
        assert_eq!(&*result.label, "class-0");
    }

    #[test]
    fn test_interpret_shape_mismatch() {
        let interpreter = OutputInterpreter::new();
        let err = interpreter.interpret(&[0.0; 4], &catalog(5)).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::ShapeMismatch {
                outputs: 4,
                labels: 5
            }
        ));
    }

    #[test]
    fn test_explicit_policies_skip_heuristic() {
        // Sum is 0.89: Auto would softmax this, Probabilities must not.
        let output = [0.80, 0.06, 0.03];
        let as_probabilities = OutputInterpreter::with_policy(ScorePolicy::Probabilities)
            .interpret(&output, &catalog(3))
            .unwrap();
        assert_eq!(as_probabilities.confidence, 0.80);

        let as_logits = OutputInterpreter::with_policy(ScorePolicy::Logits)
            .interpret(&output, &catalog(3))
            .unwrap();
        assert!(as_logits.confidence < 0.80);
    }

    #[test]
    fn test_interpret_attaches_description() {
        let labels = LabelCatalog::from_labels(["banana", "apple"])
            .with_description("banana", "rich in potassium");
        let interpreter = OutputInterpreter::new();

        let with = interpreter.interpret(&[0.9, 0.1], &labels).unwrap();
        assert_eq!(with.description.as_deref(), Some("rich in potassium"));

        let without = interpreter.interpret(&[0.1, 0.9], &labels).unwrap();
        assert!(without.description.is_none());
    }

    #[test]
    fn test_deviating_sum_is_renormalized() {
        // Sum is 6.0, far from 1.0: Auto must softmax, and the resulting
        // distribution must sum to 1 up to floating-point error.
        let interpreter = OutputInterpreter::new();
        let results = interpreter
            .top_k(&[2.0, 3.0, 1.0], &catalog(3), 3, None)
            .unwrap();
        let sum: f32 = results.iter().map(|r| r.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(&*results[0].label, "class-1");
    }

    #[test]
    fn test_top_k_ordering_and_clamping() {
        let interpreter = OutputInterpreter::with_policy(ScorePolicy::Probabilities);
        let results = interpreter
            .top_k(&[0.1, 0.6, 0.3], &catalog(3), 5, None)
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(&*results[0].label, "class-1");
        assert_eq!(&*results[1].label, "class-2");
        assert_eq!(&*results[2].label, "class-0");
    }

    #[test]
    fn test_top_k_confidence_floor() {
        let interpreter = OutputInterpreter::with_policy(ScorePolicy::Probabilities);
        let results = interpreter
            .top_k(&[0.1, 0.6, 0.3], &catalog(3), 3, Some(0.2))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.confidence >= 0.2));
    }

    #[test]
    fn test_top_k_rejects_zero_k() {
        let interpreter = OutputInterpreter::new();
        let err = interpreter
            .top_k(&[0.5, 0.5], &catalog(2), 0, None)
            .unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidInput { .. }));
    }
}
