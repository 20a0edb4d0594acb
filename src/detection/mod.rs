pub mod contours;
pub mod preprocessing;

use image::RgbImage;
use imageproc::point::Point;

use crate::config::RecognitionConfig;
use crate::models::Candidate;

/// Proposes card-shaped regions in a frame
#[derive(Debug, Clone)]
pub struct ShapeDetector {
    pub blur_kernel: u32,
    pub blur_sigma: f32,
    pub edge_low: f32,
    pub edge_high: f32,
    pub poly_tolerance: f64,
}

impl ShapeDetector {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            blur_sigma: config.blur_sigma(),
            edge_low: config.edge_low,
            edge_high: config.edge_high,
            poly_tolerance: config.poly_tolerance,
        }
    }

    /// Run blur, edge detection and external contour extraction, returning a
    /// single-pass iterator that approximates each contour into a candidate.
    pub fn detect(&self, frame: &RgbImage) -> Candidates {
        let gray = preprocessing::to_grayscale(frame);
        let blurred = preprocessing::apply_blur(&gray, self.blur_kernel, self.blur_sigma);
        let edges = preprocessing::detect_edges(&blurred, self.edge_low, self.edge_high);
        let contours = contours::find_external_contours(&edges);

        tracing::trace!(contours = contours.len(), "external contours found");

        Candidates {
            contours: contours.into_iter(),
            tolerance: self.poly_tolerance,
        }
    }
}

impl Default for ShapeDetector {
    fn default() -> Self {
        Self::new(&RecognitionConfig::default())
    }
}

/// Lazily approximated candidates of one frame
pub struct Candidates {
    contours: std::vec::IntoIter<Vec<Point<i32>>>,
    tolerance: f64,
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        let contour = self.contours.next()?;
        let polygon = contours::approximate_polygon(&contour, self.tolerance);
        let rect = contours::min_area_rect(&polygon);
        Some(Candidate { rect, polygon })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.contours.size_hint()
    }
}

/// Card-like regions are convex quadrilaterals
pub fn is_card_shape(polygon: &[Point<i32>]) -> bool {
    polygon.len() == 4 && contours::is_convex(polygon)
}
