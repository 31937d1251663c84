use camlabel_classify::{Classifier, ClassifyError, Prediction};
use camlabel_pipeline::{classify_image, spawn_display, DisplaySurface};
use camlabel_preprocess::{PixelBuffer, Preprocessor};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingDisplay {
    titles: Vec<String>,
    probs: Vec<String>,
}

impl DisplaySurface for RecordingDisplay {
    fn set_title(&mut self, text: &str) {
        self.titles.push(text.to_owned());
    }

    fn set_probability(&mut self, text: &str) {
        self.probs.push(text.to_owned());
    }
}

struct FixedClassifier {
    label: &'static str,
    probability: f32,
}

impl Classifier for FixedClassifier {
    fn predict(&self, _pixels: &PixelBuffer) -> Result<Prediction, ClassifyError> {
        Ok(prediction(self.label, self.probability))
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _pixels: &PixelBuffer) -> Result<Prediction, ClassifyError> {
        Err(ClassifyError::EmptyOutput)
    }
}

fn prediction(label: &str, probability: f32) -> Prediction {
    let mut probabilities = HashMap::new();
    probabilities.insert(label.to_owned(), probability);
    Prediction {
        label: label.to_owned(),
        probabilities,
    }
}

fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([10, 20, 30])))
}

#[tokio::test]
async fn failed_inference_leaves_display_unchanged() {
    let (handle, task) = spawn_display(RecordingDisplay::default());
    let pre = Preprocessor::new(8, 8);

    classify_image(test_image(), &pre, Arc::new(FixedClassifier { label: "cat", probability: 0.9 }), &handle)
        .await
        .unwrap();

    let err = classify_image(test_image(), &pre, Arc::new(FailingClassifier), &handle).await;
    assert!(err.is_err());

    drop(handle);
    let surface = task.await.unwrap();
    assert_eq!(surface.titles, vec!["cat"]);
}

#[tokio::test]
async fn conversion_failure_drops_the_frame() {
    let (handle, task) = spawn_display(RecordingDisplay::default());
    // degenerate target dimensions make conversion fail before inference
    let pre = Preprocessor::new(0, 8);

    let err = classify_image(test_image(), &pre, Arc::new(FixedClassifier { label: "cat", probability: 0.9 }), &handle).await;
    assert!(err.is_err());

    drop(handle);
    let surface = task.await.unwrap();
    assert!(surface.titles.is_empty());
}

#[tokio::test]
async fn probability_is_formatted_for_display() {
    let (handle, task) = spawn_display(RecordingDisplay::default());
    let pre = Preprocessor::new(8, 8);

    classify_image(
        test_image(),
        &pre,
        Arc::new(FixedClassifier { label: "tabby", probability: 0.5734 }),
        &handle,
    )
    .await
    .unwrap();

    drop(handle);
    let surface = task.await.unwrap();
    assert_eq!(surface.titles, vec!["tabby"]);
    assert_eq!(surface.probs, vec!["Prob: 57.3%"]);
}

// Two overlapping cycles: A starts first but finishes last.  The display
// shows B's result, then gets overwritten by A — last writer wins, by
// arrival order at the display task.
#[tokio::test]
async fn last_completion_wins_on_display() {
    let (handle, task) = spawn_display(RecordingDisplay::default());

    let slow_a = {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            handle.update(&prediction("A", 0.4));
        })
    };
    let fast_b = {
        let handle = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            handle.update(&prediction("B", 0.8));
        })
    };

    slow_a.await.unwrap();
    fast_b.await.unwrap();

    drop(handle);
    let surface = task.await.unwrap();
    assert_eq!(surface.titles, vec!["B", "A"]);
}
