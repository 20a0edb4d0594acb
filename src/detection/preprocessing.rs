use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;

/// Convert frame to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    imageops::grayscale(img)
}

/// Normalized 1-D Gaussian of exactly `size` taps
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - radius;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Apply a `kernel_size` x `kernel_size` Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, kernel_size: u32, sigma: f32) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size, sigma);
    separable_filter_equal(img, &kernel)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Resize a frame by a uniform factor; a factor of 1 returns a copy
pub fn scale_frame(img: &RgbImage, scale: f32) -> RgbImage {
    if (scale - 1.0).abs() < f32::EPSILON {
        return img.clone();
    }
    let width = ((img.width() as f32 * scale).round() as u32).max(1);
    let height = ((img.height() as f32 * scale).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Triangle)
}
