//! Live capture-and-classify demo.
//!
//! Snaps a still from the first available camera every interval, runs it
//! through a pretrained ONNX classifier, and logs the top label plus its
//! confidence.  Runs until ctrl-c.
//!
//! Usage: cargo run --bin live_classify -- --model m.onnx --labels labels.txt

use anyhow::{Context, Result};
use camlabel_camera::Camera;
use camlabel_classify::TractClassifier;
use camlabel_pipeline::{spawn_display, ConsoleDisplay, PipelineConfig, SnapshotLoop};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
struct CliArgs {
    /// Optional JSON config; CLI flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long)]
    labels: Option<PathBuf>,

    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(labels) = args.labels {
        config.labels_path = labels;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.capture_interval_ms = interval_ms;
    }

    let camera = Camera::new(config.camera_width, config.camera_height)
        .context("Failed to initialize camera")?;

    let classifier = TractClassifier::new(
        &config.model_path,
        &config.labels_path,
        config.input_width,
        config.input_height,
    )
    .context("Failed to load classifier")?;

    let (display, _display_task) = spawn_display(ConsoleDisplay);
    let snapshot = SnapshotLoop::new(camera, Arc::new(classifier), display, &config);

    log::info!(
        "classifying a still every {:?}; press ctrl-c to quit",
        config.capture_interval()
    );

    tokio::select! {
        _ = snapshot.run() => {}
        _ = tokio::signal::ctrl_c() => {
            log::info!("shutting down");
        }
    }

    Ok(())
}
