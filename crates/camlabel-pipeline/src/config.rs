use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the capture-and-classify loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How often a new still is snapped, in milliseconds.
    pub capture_interval_ms: u64,
    /// Capture session frame size.
    pub camera_width: u32,
    pub camera_height: u32,
    /// Model input resolution.  This is the model's native size in pixels;
    /// no display-scale correction is applied.
    pub input_width: u32,
    pub input_height: u32,
    /// Path to the pretrained ONNX classifier.
    pub model_path: PathBuf,
    /// Path to the labels file, one label per line.
    pub labels_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capture_interval_ms: 500,
            camera_width: 1280,
            camera_height: 720,
            input_width: 224,
            input_height: 224,
            model_path: PathBuf::from("./models/classifier.onnx"),
            labels_path: PathBuf::from("./models/labels.txt"),
        }
    }
}

impl PipelineConfig {
    /// Load a config from JSON.  Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {path:?}"))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse config: {path:?}"))
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms)
    }
}
