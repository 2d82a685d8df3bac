//! ONNX Runtime session wrapper.
//!
//! [`ModelSession`] owns the loaded inference session as an explicit
//! resource handle: the caller controls its lifecycle, the preprocessing
//! and interpretation code stays stateless. Load failures surface as
//! `ModelUnavailable` so the host can report them and try again later.

use crate::core::errors::ClassifyError;
use crate::core::tensor::{NormalizationRange, Tensor4D, TensorSpec};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A loaded classification model.
pub struct ModelSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: Option<String>,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for ModelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSession")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl ModelSession {
    /// Loads an ONNX model from a file.
    ///
    /// The input tensor name is discovered from the session; the output
    /// name is resolved lazily on the first run.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the ONNX model file.
    ///
    /// # Errors
    ///
    /// `ModelUnavailable` when the session cannot be created or the model
    /// declares no inputs.
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        let path = model_path.as_ref();
        let session = Session::builder()?
            .with_log_level(LogLevel::Error)?
            .commit_from_file(path)
            .map_err(|e| {
                ClassifyError::model_unavailable(format!(
                    "failed to create session for '{}': {e}",
                    path.display()
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| {
                ClassifyError::model_unavailable(format!(
                    "model '{}' declares no inputs",
                    path.display()
                ))
            })?;

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(model = %model_name, input = %input_name, "model session created");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name: None,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this session.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this session.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Derives the input tensor spec from the model's declared input shape.
    ///
    /// # Arguments
    ///
    /// * `range` - The normalization range the model was trained with;
    ///   this cannot be introspected and must come from configuration.
    ///
    /// # Errors
    ///
    /// `UnsupportedChannels` / `InvalidInput` when the declared shape is
    /// not a static 3-channel BHWC shape, before any preprocessing runs.
    pub fn input_spec(&self, range: NormalizationRange) -> Result<TensorSpec, ClassifyError> {
        let shape = self.primary_input_shape()?.ok_or_else(|| {
            ClassifyError::invalid_input(format!(
                "model '{}' input is not a tensor",
                self.model_name
            ))
        })?;
        TensorSpec::from_input_shape(&shape, range)
    }

    /// Retrieves the primary input tensor shape from the session, dynamic
    /// dimensions as-is.
    fn primary_input_shape(&self) -> Result<Option<Vec<i64>>, ClassifyError> {
        let session = self.lock_session()?;
        let input = session.inputs.first().ok_or_else(|| {
            ClassifyError::model_unavailable(format!(
                "model '{}' declares no inputs",
                self.model_name
            ))
        })?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Ok(Some(shape.iter().copied().collect())),
            _ => Ok(None),
        }
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Session>, ClassifyError> {
        self.session.lock().map_err(|_| {
            ClassifyError::model_unavailable("inference session lock is poisoned".to_string())
        })
    }

    /// Runs the model over a single-element batch and returns the raw
    /// output vector for that element.
    ///
    /// The output is validated to be a `[1, N]` tensor; its length is not
    /// checked against any label catalog here, that is the interpreter's
    /// contract.
    ///
    /// # Arguments
    ///
    /// * `batch` - An input batch shaped `[1, H, W, C]`.
    ///
    /// # Errors
    ///
    /// `Session` errors from ONNX Runtime, and `InvalidInput` when the
    /// model produces something other than a 2D single-row output.
    pub fn run(&self, batch: &Tensor4D) -> Result<Vec<f32>, ClassifyError> {
        let input_tensor = TensorRef::from_array_view(batch.view())?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.lock_session()?;

        let output_name = match &self.output_name {
            Some(name) => name.clone(),
            None => session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| {
                    ClassifyError::model_unavailable(format!(
                        "model '{}' declares no outputs",
                        self.model_name
                    ))
                })?,
        };

        let outputs = session.run(inputs)?;
        let (output_shape, output_data) =
            outputs[output_name.as_str()].try_extract_tensor::<f32>()?;

        if output_shape.len() != 2 || output_shape[0] != 1 {
            return Err(ClassifyError::invalid_input(format!(
                "model '{}' produced output shape {:?}, expected [1, N]",
                self.model_name, output_shape
            )));
        }

        debug!(
            model = %self.model_name,
            classes = output_shape[1],
            "inference completed"
        );

        Ok(output_data.to_vec())
    }
}
