use image::RgbImage;
use imageproc::point::Point;

/// A decoded video frame tagged with its position in the source stream
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: usize, image: RgbImage) -> Self {
        Self { index, image }
    }
}

/// Rotated rectangle: center, (width, height) and angle in degrees.
///
/// The width is measured along the direction `angle` in image coordinates
/// (x right, y down). Rectangles produced by the detector keep the angle in
/// `[-90, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedRect {
    pub center: (f32, f32),
    pub size: (f32, f32),
    pub angle: f32,
}

impl OrientedRect {
    pub fn new(center: (f32, f32), size: (f32, f32), angle: f32) -> Self {
        Self { center, size, angle }
    }

    /// Size and angle after folding rectangles tilted past -45 degrees onto
    /// the acute side: width and height swap and the angle gains 90.
    pub fn upright(&self) -> ((f32, f32), f32) {
        if self.angle < -45.0 {
            ((self.size.1, self.size.0), self.angle + 90.0)
        } else {
            (self.size, self.angle)
        }
    }

    pub fn area(&self) -> f32 {
        self.size.0 * self.size.1
    }
}

/// A card-shaped region proposed by the shape detector
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Minimum-area rectangle enclosing `polygon`
    pub rect: OrientedRect,
    /// Approximated contour polygon the rectangle was derived from
    pub polygon: Vec<Point<i32>>,
}

pub const UNKNOWN_LABEL: &str = "Unknown";

/// Outcome of classifying one rectified crop against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub label: String,
    /// Inverse of the mean descriptor distance of the best entry, 0 when unknown
    pub confidence: f32,
    /// Catalog position of the selected entry
    pub reference: Option<usize>,
}

impl MatchResult {
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            reference: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.reference.is_none()
    }
}

/// An outline and label burned into an annotated frame
#[derive(Debug, Clone)]
pub struct Overlay {
    pub polygon: Vec<Point<i32>>,
    pub label: String,
    pub confidence: f32,
}

/// A processed frame ready for aggregation
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub index: usize,
    pub image: RgbImage,
    pub overlays: Vec<Overlay>,
}
