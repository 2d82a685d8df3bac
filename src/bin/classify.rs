//! Command-line fruit classification.
//!
//! Usage: `classify <model.onnx> <image> [image...]`
//!
//! Loads the model with the built-in fruit catalog and prints the ranked
//! predictions for each image. Set `RUST_LOG=debug` for pipeline logs.

use fruitsnap::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    fruitsnap::utils::init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(model_path), Some(first_image)) = (args.next(), args.next()) else {
        eprintln!("usage: classify <model.onnx> <image> [image...]");
        return ExitCode::FAILURE;
    };

    let classifier = match FruitClassifier::builder()
        .model_path(&model_path)
        .normalization(NormalizationRange::NegOneToOne)
        .build()
    {
        Ok(classifier) => classifier,
        Err(e) => {
            eprintln!("failed to load model '{model_path}': {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = false;
    let images: Vec<PathBuf> = std::iter::once(first_image)
        .chain(args)
        .map(PathBuf::from)
        .collect();

    for path in &images {
        println!("{}:", path.display());
        match classifier.classify_top_k(path) {
            Ok(results) if results.is_empty() => println!("  no prediction above threshold"),
            Ok(results) => {
                for result in results {
                    match &result.description {
                        Some(description) => println!(
                            "  {:<16} {:>5.1}%  {}",
                            result.label,
                            result.confidence * 100.0,
                            description
                        ),
                        None => println!(
                            "  {:<16} {:>5.1}%",
                            result.label,
                            result.confidence * 100.0
                        ),
                    }
                }
            }
            Err(e) => {
                eprintln!("  error: {e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
