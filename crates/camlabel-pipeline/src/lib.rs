//! camlabel‑pipeline – the capture‑and‑classify loop.
//!
//! Ties the other crates together: a timer snaps a still every interval, the
//! photo is decoded, converted into the model's pixel layout, classified, and
//! the result is marshalled to the display task.
//!
//! Per cycle: Idle → tick → Capturing → Converting → Inferring → Displaying.
//! There is no queueing or backpressure between ticks: a new capture is
//! issued even when a previous cycle is still in flight, so overlapping
//! inferences can complete out of order and the last one to finish wins the
//! displayed label.
//!
//! Per-frame failures (capture, decode, conversion, inference) drop the
//! frame with a warning and leave the previous displayed value in place.
//! Only camera setup failure is surfaced to the caller.

use anyhow::{Context, Result};
use camlabel_camera::Camera;
use camlabel_classify::Classifier;
use camlabel_preprocess::Preprocessor;
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;
use std::time::Duration;

mod config;
mod display;

pub use config::PipelineConfig;
pub use display::{
    format_probability, spawn_display, ConsoleDisplay, DisplayHandle, DisplaySurface,
    DisplayUpdate,
};

/// Timer-driven snapshot loop over an explicit camera and classifier handle.
pub struct SnapshotLoop {
    camera: Arc<Camera>,
    preprocessor: Preprocessor,
    classifier: Arc<dyn Classifier + Send + Sync>,
    display: DisplayHandle,
    interval: Duration,
}

impl SnapshotLoop {
    pub fn new(
        camera: Camera,
        classifier: Arc<dyn Classifier + Send + Sync>,
        display: DisplayHandle,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            camera: Arc::new(camera),
            preprocessor: Preprocessor::new(config.input_width, config.input_height),
            classifier,
            display,
            interval: config.capture_interval(),
        }
    }

    /// Fire a capture on every tick until the caller cancels the future.
    /// Each tick spawns its own cycle regardless of what is still in flight.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;

            let camera = Arc::clone(&self.camera);
            let preprocessor = self.preprocessor.clone();
            let classifier = Arc::clone(&self.classifier);
            let display = self.display.clone();

            tokio::spawn(async move {
                if let Err(e) = snapshot_cycle(&camera, &preprocessor, classifier, &display).await
                {
                    // per-frame policy: drop and continue
                    log::warn!("frame dropped: {e:#}");
                }
            });
        }
    }
}

async fn snapshot_cycle(
    camera: &Camera,
    preprocessor: &Preprocessor,
    classifier: Arc<dyn Classifier + Send + Sync>,
    display: &DisplayHandle,
) -> Result<()> {
    let photo = camera.capture_photo().await.context("capture photo")?;
    let image = image::load_from_memory_with_format(&photo.jpeg, ImageFormat::Jpeg)
        .context("decode JPEG")?;
    classify_image(image, preprocessor, classifier, display).await
}

/// Convert one decoded bitmap, run inference on a blocking worker, and queue
/// the prediction for display.  Any error drops the frame without touching
/// the display.
pub async fn classify_image(
    image: DynamicImage,
    preprocessor: &Preprocessor,
    classifier: Arc<dyn Classifier + Send + Sync>,
    display: &DisplayHandle,
) -> Result<()> {
    let pixels = preprocessor.run(&image).context("convert to pixel buffer")?;

    let prediction = tokio::task::spawn_blocking(move || classifier.predict(&pixels))
        .await
        .context("inference task")??;

    log::debug!(
        "predicted {} ({:.3})",
        prediction.label,
        prediction.probability_of(&prediction.label)
    );
    display.update(&prediction);
    Ok(())
}
