use image::RgbImage;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CardScanError, Result};
use crate::features::{DescriptorSet, FeatureExtractor};

/// A labelled reference card and its descriptors
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    pub label: String,
    pub descriptors: DescriptorSet,
}

/// Immutable, ordered set of reference cards
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ReferenceEntry>,
}

/// One line of a catalog manifest file
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub image: PathBuf,
    pub label: String,
}

impl Catalog {
    /// Describe every reference image once, keeping the input order
    pub fn build(references: Vec<(RgbImage, String)>, extractor: &FeatureExtractor) -> Self {
        let entries: Vec<ReferenceEntry> = references
            .into_par_iter()
            .map(|(image, label)| {
                let descriptors = extractor.extract(&image);
                if descriptors.is_empty() {
                    tracing::warn!(%label, "reference image produced no descriptors");
                }
                ReferenceEntry { label, descriptors }
            })
            .collect();

        tracing::info!(entries = entries.len(), "catalog built");
        Self { entries }
    }

    /// Load the images named by a JSON manifest and build the catalog.
    /// Image paths are resolved against the manifest's directory.
    pub fn load(manifest_path: &Path, extractor: &FeatureExtractor) -> Result<Self> {
        let text = std::fs::read_to_string(manifest_path).map_err(|e| CardScanError::Manifest {
            path: manifest_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let manifest: Vec<ManifestEntry> =
            serde_json::from_str(&text).map_err(|e| CardScanError::Manifest {
                path: manifest_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        let references = manifest
            .into_iter()
            .map(|entry| {
                let path = base.join(&entry.image);
                let image = load_image(&path, &entry.label)?;
                Ok((image, entry.label))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::build(references, extractor))
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ReferenceEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Open and decode a reference image as RGB
pub fn load_image(path: &Path, label: &str) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| CardScanError::CatalogLoad {
            label: label.to_string(),
            path: path.to_path_buf(),
            source,
        })
}
