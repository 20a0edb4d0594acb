use anyhow::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::annotate::Annotator;
use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::config::RecognitionConfig;
use crate::detection::{preprocessing, ShapeDetector};
use crate::error::CardScanError;
use crate::features::FeatureExtractor;
use crate::models::{AnnotatedFrame, Frame};
use crate::rectify::rectify;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// Path of a rectified crop, e.g. "00012/03.png" for the third candidate of frame 12
    pub fn crop_path(&self, frame_index: usize, candidate: usize) -> PathBuf {
        self.output_dir
            .join(format!("{:05}", frame_index))
            .join(format!("{:02}.png", candidate + 1))
    }

    fn save_crop(&self, frame_index: usize, candidate: usize, crop: &RgbImage) -> Result<()> {
        let path = self.crop_path(frame_index, candidate);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        crop.save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug crop {}: {}", path.display(), e))?;
        tracing::trace!(path = %path.display(), "saved debug crop");
        Ok(())
    }
}

/// Context available to every frame run
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub candidates: usize,
    pub dropped: usize,
    pub overlays: usize,
}

/// Detector, rectifier, classifier and annotator applied to one frame
pub struct FramePipeline<'a> {
    detector: ShapeDetector,
    extractor: FeatureExtractor,
    annotator: Annotator,
    catalog: &'a Catalog,
    input_scale: f32,
    context: PipelineContext,
}

impl<'a> FramePipeline<'a> {
    pub fn new(config: &RecognitionConfig, catalog: &'a Catalog) -> Self {
        Self {
            detector: ShapeDetector::new(config),
            extractor: FeatureExtractor::new(config),
            annotator: Annotator::new(),
            catalog,
            input_scale: config.input_scale,
            context: PipelineContext::default(),
        }
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Use a specific extractor; it must match the one the catalog was built with
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.context.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Recognize and annotate every card region of `frame`.
    ///
    /// Every candidate is rectified and classified; candidates whose crop is
    /// empty are skipped. Annotation goes onto a private copy of the frame.
    pub fn process(&self, frame: Frame) -> Result<(AnnotatedFrame, FrameStats)> {
        let working = preprocessing::scale_frame(&frame.image, self.input_scale);
        let mut canvas = working.clone();
        let classifier = Classifier::new(self.catalog, &self.extractor);

        let mut stats = FrameStats::default();
        let mut overlays = Vec::new();

        for (idx, candidate) in self.detector.detect(&working).enumerate() {
            stats.candidates += 1;

            let crop = match rectify(&working, &candidate.rect) {
                Ok(crop) => crop,
                Err(CardScanError::EmptyCrop) => {
                    stats.dropped += 1;
                    tracing::trace!(frame = frame.index, candidate = idx, "empty crop dropped");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(debug) = &self.context.debug {
                debug.save_crop(frame.index, idx, &crop)?;
            }

            let result = classifier.classify(&crop);
            if let Some(overlay) = self.annotator.annotate(&mut canvas, &candidate.polygon, &result) {
                tracing::debug!(
                    frame = frame.index,
                    label = %overlay.label,
                    confidence = overlay.confidence,
                    "card recognized"
                );
                overlays.push(overlay);
            }
        }

        stats.overlays = overlays.len();
        tracing::debug!(
            frame = frame.index,
            candidates = stats.candidates,
            dropped = stats.dropped,
            overlays = stats.overlays,
            "frame processed"
        );

        Ok((
            AnnotatedFrame {
                index: frame.index,
                image: canvas,
                overlays,
            },
            stats,
        ))
    }
}
