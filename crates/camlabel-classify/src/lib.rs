// camlabel-classify/src/lib.rs
// ============================================================
// camlabel-classify  –  image-classification stage
// Runs a pretrained ONNX classifier via Tract (pure Rust).
// ------------------------------------------------------------
// Pipeline: PixelBuffer → Tensor → Prediction
// ------------------------------------------------------------
// Public API
//   * TractClassifier::new(model, labels, w, h) – load & optimise
//   * Classifier::predict(&PixelBuffer)         – returns Prediction
//     where Prediction { label, label→probability map }
// ============================================================

//! camlabel – classification layer
//!
//! Exposes a backend-agnostic [`Classifier`] trait plus a concrete
//! [`TractClassifier`] that runs a fixed-input-size ONNX network.  The
//! model runtime is treated as a black box: it consumes one pixel buffer
//! and yields a top label plus a label→probability map.  Swapping engines
//! is a matter of implementing the trait – the outer API stays identical.
//!
//! Input comes from `camlabel-preprocess` as a flipped BGRA [`PixelBuffer`];
//! this layer reads it in the runtime's bottom-left convention, so row 0 of
//! the buffer is sampled as the last bitmap row.

use camlabel_preprocess::{PixelBuffer, BYTES_PER_PIXEL};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tract_onnx::prelude::tract_ndarray;
use tract_onnx::prelude::*;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Model load or inference error: {0}")]
    Tract(#[from] TractError),
    #[error("Failed to read labels: {0}")]
    Labels(#[from] std::io::Error),
    #[error("labels file {0} contains no labels")]
    NoLabels(PathBuf),
    #[error("model returned {got} scores for {expected} labels")]
    LabelCount { expected: usize, got: usize },
    #[error("pixel buffer is {got_w}x{got_h}, model expects {want_w}x{want_h}")]
    InputShape { want_w: u32, want_h: u32, got_w: u32, got_h: u32 },
    #[error("model produced no output tensor")]
    EmptyOutput,
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

/// One inference result: the top label and the full label→probability map.
/// Probabilities are in 0.0–1.0 as reported by the runtime; this layer does
/// not validate or renormalise them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub probabilities: HashMap<String, f32>,
}

impl Prediction {
    /// Probability of `label`, 0.0 when the runtime did not report one.
    pub fn probability_of(&self, label: &str) -> f32 {
        self.probabilities.get(label).copied().unwrap_or(0.0)
    }
}

/// Trait for classification backends.
pub trait Classifier {
    fn predict(&self, pixels: &PixelBuffer) -> Result<Prediction>;
}

/// Tract-powered ONNX classifier with a fixed `[1, 3, H, W]` input.
pub struct TractClassifier {
    model: RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>,
    labels: Vec<String>,
    width: u32,
    height: u32,
}

impl TractClassifier {
    /// Load and optimize the ONNX model and its labels file (one label per
    /// line), preparing the network for inference at `width` × `height`.
    pub fn new(model_path: &Path, labels_path: &Path, width: u32, height: u32) -> Result<Self> {
        let labels = load_labels(labels_path)?;

        let model = tract_onnx::onnx()
            .model_for_path(model_path)?
            .with_input_fact(0, f32::fact([1, 3, height as i32, width as i32]).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { model, labels, width, height })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Classifier for TractClassifier {
    fn predict(&self, pixels: &PixelBuffer) -> Result<Prediction> {
        if pixels.width() != self.width || pixels.height() != self.height {
            return Err(ClassifyError::InputShape {
                want_w: self.width,
                want_h: self.height,
                got_w: pixels.width(),
                got_h: pixels.height(),
            });
        }

        let (w, h) = (self.width as usize, self.height as usize);

        // BGRA, bottom-left origin → RGB planes, top-left origin
        let tensor: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
                let row = pixels.row((h - 1 - y) as u32);
                let px = &row[x * BYTES_PER_PIXEL..(x + 1) * BYTES_PER_PIXEL];
                let v = match c {
                    0 => px[2],
                    1 => px[1],
                    _ => px[0],
                };
                v as f32 / 255.0
            })
            .into();

        let outputs = self.model.run(tvec![tensor.into()])?;
        let view = outputs
            .first()
            .ok_or(ClassifyError::EmptyOutput)?
            .to_array_view::<f32>()?;
        let scores: Vec<f32> = view.iter().copied().collect();

        if scores.len() != self.labels.len() {
            return Err(ClassifyError::LabelCount {
                expected: self.labels.len(),
                got: scores.len(),
            });
        }

        let probs = softmax(&scores);
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .ok_or(ClassifyError::EmptyOutput)?;

        let probabilities = self
            .labels
            .iter()
            .cloned()
            .zip(probs.iter().copied())
            .collect();

        Ok(Prediction {
            label: self.labels[best].clone(),
            probabilities,
        })
    }
}

/// Read a labels file, one label per line.  Blank lines are skipped.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let labels: Vec<String> = std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();

    if labels.is_empty() {
        return Err(ClassifyError::NoLabels(path.to_owned()));
    }
    Ok(labels)
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
