//! Image preprocessing and output interpretation.

pub mod interpret;
pub mod normalize;

pub use interpret::{softmax, Classification, OutputInterpreter, ScorePolicy};
pub use normalize::{ImageNormalizer, ImageResizer, StretchResizer};
