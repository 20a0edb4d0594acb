//! Keypoint detection and binary descriptors.
//!
//! Keypoints come from FAST-9 on the grayscale image. Each keypoint is
//! described by 256 intensity comparisons between point pairs of a fixed
//! pseudo-random pattern inside a 31x31 patch of the smoothed image, so the
//! same image always yields the same descriptors.
use image::{GrayImage, RgbImage};
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use std::sync::OnceLock;

use crate::config::RecognitionConfig;
use crate::detection::preprocessing;

/// Half side of the square patch sampled around each keypoint
pub const PATCH_RADIUS: u32 = 15;
pub const DESCRIPTOR_BYTES: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;
const SMOOTHING_SIGMA: f32 = 2.0;

/// A 256-bit binary feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(pub [u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    /// Number of differing bits
    pub fn distance(&self, other: &Descriptor) -> u32 {
        self.0
            .chunks_exact(8)
            .zip(other.0.chunks_exact(8))
            .map(|(a, b)| {
                let a = u64::from_le_bytes(a.try_into().unwrap_or([0; 8]));
                let b = u64::from_le_bytes(b.try_into().unwrap_or([0; 8]));
                (a ^ b).count_ones()
            })
            .sum()
    }
}

/// Unordered descriptors of one image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        Self { descriptors }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    /// Distance from `query` to its nearest descriptor in this set
    pub fn nearest(&self, query: &Descriptor) -> Option<u32> {
        self.descriptors.iter().map(|d| query.distance(d)).min()
    }
}

type TestPair = ((i32, i32), (i32, i32));

fn sampling_pattern() -> &'static [TestPair] {
    static PATTERN: OnceLock<Vec<TestPair>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // xorshift32 with a fixed seed
        let mut state: u32 = 0x9E37_79B9;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let span = (2 * PATCH_RADIUS + 1) as u32;
        let mut offset = move || (next() % span) as i32 - PATCH_RADIUS as i32;

        (0..DESCRIPTOR_BITS)
            .map(|_| ((offset(), offset()), (offset(), offset())))
            .collect()
    })
}

/// Detects keypoints and computes their descriptors
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    pub fast_threshold: u8,
    pub max_features: usize,
}

impl FeatureExtractor {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            fast_threshold: config.fast_threshold,
            max_features: config.max_features,
        }
    }

    pub fn extract(&self, image: &RgbImage) -> DescriptorSet {
        let gray = preprocessing::to_grayscale(image);
        self.extract_gray(&gray)
    }

    pub fn extract_gray(&self, gray: &GrayImage) -> DescriptorSet {
        let (width, height) = gray.dimensions();
        if width <= 2 * PATCH_RADIUS || height <= 2 * PATCH_RADIUS {
            return DescriptorSet::default();
        }

        let mut corners: Vec<_> = corners_fast9(gray, self.fast_threshold)
            .into_iter()
            .filter(|c| {
                c.x >= PATCH_RADIUS
                    && c.y >= PATCH_RADIUS
                    && c.x < width - PATCH_RADIUS
                    && c.y < height - PATCH_RADIUS
            })
            .collect();
        if corners.is_empty() {
            return DescriptorSet::default();
        }

        // Strongest first; position breaks ties so the order is stable
        corners.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners.truncate(self.max_features);

        let smoothed = gaussian_blur_f32(gray, SMOOTHING_SIGMA);
        let descriptors = corners
            .iter()
            .map(|c| describe(&smoothed, c.x, c.y))
            .collect();
        DescriptorSet::new(descriptors)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&RecognitionConfig::default())
    }
}

fn describe(img: &GrayImage, x: u32, y: u32) -> Descriptor {
    let mut bits = [0u8; DESCRIPTOR_BYTES];
    let sample = |(dx, dy): (i32, i32)| {
        img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0]
    };
    for (i, &(p, q)) in sampling_pattern().iter().enumerate() {
        if sample(p) < sample(q) {
            bits[i / 8] |= 1 << (i % 8);
        }
    }
    Descriptor(bits)
}
