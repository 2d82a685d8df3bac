//! # fruitsnap
//!
//! On-device fruit image classification: convert a photo into the
//! fixed-size tensor a pre-trained model expects, run it through ONNX
//! Runtime, and turn the raw output into a label with confidence and a
//! textual description.
//!
//! ## Components
//!
//! - **Image normalization**: stretch-resize to the model geometry and
//!   write normalized RGB values in row-major, channel-interleaved order
//! - **Inference**: a thin ONNX Runtime session wrapper with input-shape
//!   introspection
//! - **Output interpretation**: softmax where needed, top-label selection,
//!   description lookup
//! - **Label catalogs**: ordered labels index-aligned with model output,
//!   loadable from text or JSON
//!
//! ## Modules
//!
//! * [`core`] - Errors, tensor types, configuration, and the model session
//! * [`domain`] - Label and description catalogs
//! * [`processors`] - Image normalization and output interpretation
//! * [`pipeline`] - The end-to-end classifier
//! * [`utils`] - Image loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fruitsnap::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = FruitClassifier::builder()
//!     .model_path("models/fruit.onnx")
//!     .normalization(NormalizationRange::NegOneToOne)
//!     .score_policy(ScorePolicy::Logits)
//!     .build()?;
//!
//! let result = classifier.classify(Path::new("photo.jpg"))?;
//! println!(
//!     "{} ({:.1}%): {}",
//!     result.label,
//!     result.confidence * 100.0,
//!     result.description.as_deref().unwrap_or("no description"),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! The two stages are also usable on their own, without a model:
//!
//! ```rust
//! use fruitsnap::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let interpreter = OutputInterpreter::new();
//! let labels = LabelCatalog::from_lines("apple\nbanana\norange");
//! let result = interpreter.interpret(&[0.1, 0.8, 0.1], &labels)?;
//! assert_eq!(&*result.label, "banana");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use fruitsnap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ChannelOrder, ClassifierConfig, ClassifyError, ClassifyResult, InputTensor,
        NormalizationRange, TensorSpec,
    };
    pub use crate::domain::{fruit_catalog, LabelCatalog};
    pub use crate::pipeline::{FruitClassifier, FruitClassifierBuilder};
    pub use crate::processors::{
        Classification, ImageNormalizer, OutputInterpreter, ScorePolicy,
    };
    pub use crate::utils::load_image;
}
