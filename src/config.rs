use serde::Deserialize;
use std::path::Path;

use crate::error::{CardScanError, Result};

/// Output frame resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl Default for OutputSize {
    fn default() -> Self {
        Self {
            width: 480,
            height: 360,
        }
    }
}

/// Tunable parameters of the recognition pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Side of the square Gaussian kernel applied before edge detection (odd)
    pub blur_kernel: u32,
    /// Canny low threshold
    pub edge_low: f32,
    /// Canny high threshold
    pub edge_high: f32,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub poly_tolerance: f64,
    /// Resolution of the frames handed to the sink
    pub output_size: OutputSize,
    /// Scale factor applied to every input frame before detection
    pub input_scale: f32,
    /// FAST-9 intensity threshold for keypoint detection
    pub fast_threshold: u8,
    /// Maximum number of keypoints described per image
    pub max_features: usize,
    /// Frames queued per worker before the reader blocks
    pub channel_capacity: usize,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 11,
            edge_low: 100.0,
            edge_high: 150.0,
            poly_tolerance: 0.02,
            output_size: OutputSize::default(),
            input_scale: 0.5,
            fast_threshold: 20,
            max_features: 500,
            channel_capacity: 4,
        }
    }
}

impl RecognitionConfig {
    /// Load a configuration from a JSON file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Same values with the input scale replaced
    pub fn with_input_scale(mut self, scale: f32) -> Self {
        self.input_scale = scale;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(CardScanError::InvalidConfig(format!(
                "blur_kernel must be odd and positive, got {}",
                self.blur_kernel
            )));
        }
        if !(self.edge_low >= 0.0 && self.edge_low <= self.edge_high) {
            return Err(CardScanError::InvalidConfig(format!(
                "edge thresholds must satisfy 0 <= low <= high, got {} / {}",
                self.edge_low, self.edge_high
            )));
        }
        if !(self.poly_tolerance > 0.0) {
            return Err(CardScanError::InvalidConfig(
                "poly_tolerance must be positive".to_string(),
            ));
        }
        if self.output_size.width == 0 || self.output_size.height == 0 {
            return Err(CardScanError::InvalidConfig(
                "output_size must be non-empty".to_string(),
            ));
        }
        if !(self.input_scale > 0.0) {
            return Err(CardScanError::InvalidConfig(
                "input_scale must be positive".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(CardScanError::InvalidConfig(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Gaussian sigma equivalent to the configured kernel size
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}
