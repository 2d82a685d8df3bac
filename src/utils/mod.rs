//! Utility functions for the classification pipeline.

use crate::core::errors::ClassifyError;
use image::DynamicImage;
use std::path::Path;

/// Loads an image from a file path.
///
/// # Arguments
///
/// * `path` - A reference to the path of the image file to load
///
/// # Errors
///
/// Returns an `ImageLoad` error if the image cannot be decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage, ClassifyError> {
    Ok(image::open(path)?)
}

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
