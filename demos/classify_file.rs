//! One-shot classification of an image file: decode → preprocess → predict.
//! Same path the live loop takes per frame, minus the camera.
//!
//! Usage: cargo run --bin classify_file -- --model m.onnx --labels labels.txt photo.jpg

use anyhow::{Context, Result};
use camlabel_classify::{Classifier, TractClassifier};
use camlabel_pipeline::format_probability;
use camlabel_preprocess::Preprocessor;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
struct CliArgs {
    image: PathBuf,

    #[arg(long)]
    model: PathBuf,

    #[arg(long)]
    labels: PathBuf,

    #[arg(long, default_value = "224")]
    width: u32,

    #[arg(long, default_value = "224")]
    height: u32,

    /// Dump the full label→probability map as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let image = image::open(&args.image)
        .with_context(|| format!("Failed to open image: {:?}", args.image))?;

    let classifier = TractClassifier::new(&args.model, &args.labels, args.width, args.height)
        .context("Failed to load classifier")?;

    let pixels = Preprocessor::new(args.width, args.height)
        .run(&image)
        .context("Failed to convert image")?;

    let prediction = classifier.predict(&pixels).context("Inference failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!(
            "{} (Prob: {})",
            prediction.label,
            format_probability(prediction.probability_of(&prediction.label) as f64)
        );
    }

    Ok(())
}
