use image::RgbImage;

use crate::catalog::Catalog;
use crate::features::{DescriptorSet, FeatureExtractor};
use crate::models::MatchResult;

/// Scores below this are treated as this value when inverting to a confidence
pub const MIN_DISTANCE: f32 = 1e-3;

/// Mean distance from every query descriptor to its nearest reference
/// descriptor; `None` when either set is empty.
pub fn mean_match_distance(query: &DescriptorSet, reference: &DescriptorSet) -> Option<f32> {
    if query.is_empty() || reference.is_empty() {
        return None;
    }
    let total: u64 = query
        .iter()
        .filter_map(|d| reference.nearest(d))
        .map(u64::from)
        .sum();
    Some(total as f32 / query.len() as f32)
}

/// Nearest-match classifier over a shared catalog
pub struct Classifier<'a> {
    catalog: &'a Catalog,
    extractor: &'a FeatureExtractor,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a Catalog, extractor: &'a FeatureExtractor) -> Self {
        Self { catalog, extractor }
    }

    pub fn classify(&self, crop: &RgbImage) -> MatchResult {
        let query = self.extractor.extract(crop);
        self.classify_descriptors(&query)
    }

    /// Pick the entry with the smallest mean distance; the first entry wins ties
    pub fn classify_descriptors(&self, query: &DescriptorSet) -> MatchResult {
        let mut best: Option<(usize, f32)> = None;

        for (index, entry) in self.catalog.entries().iter().enumerate() {
            let Some(score) = mean_match_distance(query, &entry.descriptors) else {
                continue;
            };
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) => MatchResult {
                label: self.catalog.entries()[index].label.clone(),
                confidence: 1.0 / score.max(MIN_DISTANCE),
                reference: Some(index),
            },
            None => MatchResult::unknown(),
        }
    }
}
