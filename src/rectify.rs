//! Rotation rectification of oriented card regions.
//!
//! The whole frame is rotated about the region center so the region becomes
//! axis-aligned, then a sub-pixel patch is cut out around that center and
//! turned to portrait.
use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate, Interpolation};

use crate::error::{CardScanError, Result};
use crate::models::OrientedRect;

/// Produce an upright portrait crop of `rect` from `frame`.
///
/// Fails with [`CardScanError::EmptyCrop`] when the rounded patch has no area
/// or the rectangle center lies outside the frame.
pub fn rectify(frame: &RgbImage, rect: &OrientedRect) -> Result<RgbImage> {
    let ((width, height), angle) = rect.upright();
    let patch_w = width.round();
    let patch_h = height.round();
    if !(patch_w >= 1.0 && patch_h >= 1.0) {
        return Err(CardScanError::EmptyCrop);
    }

    let (cx, cy) = rect.center;
    if frame.width() == 0
        || frame.height() == 0
        || !(cx >= 0.0 && cy >= 0.0 && cx < frame.width() as f32 && cy < frame.height() as f32)
    {
        return Err(CardScanError::EmptyCrop);
    }

    // Map the width axis (direction `angle`) onto +x.
    let rotated = if angle == 0.0 {
        frame.clone()
    } else {
        rotate(
            frame,
            rect.center,
            (-angle).to_radians(),
            Interpolation::Bicubic,
            Rgb([0, 0, 0]),
        )
    };

    let patch = rect_sub_pix(&rotated, rect.center, patch_w as u32, patch_h as u32);
    if patch.width() > patch.height() {
        Ok(imageops::rotate90(&patch))
    } else {
        Ok(patch)
    }
}

/// Bilinearly sample a `width` x `height` patch centered at `center`,
/// replicating edge pixels outside the source.
pub fn rect_sub_pix(src: &RgbImage, center: (f32, f32), width: u32, height: u32) -> RgbImage {
    let x0 = center.0 - (width as f32 - 1.0) * 0.5;
    let y0 = center.1 - (height as f32 - 1.0) * 0.5;
    let max_x = src.width() as i64 - 1;
    let max_y = src.height() as i64 - 1;

    let texel = |x: i64, y: i64| -> [f32; 3] {
        let p = src.get_pixel(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32);
        [p[0] as f32, p[1] as f32, p[2] as f32]
    };

    RgbImage::from_fn(width, height, |x, y| {
        let sx = x0 + x as f32;
        let sy = y0 + y as f32;
        let fx = sx.floor();
        let fy = sy.floor();
        let (ax, ay) = (sx - fx, sy - fy);
        let (ix, iy) = (fx as i64, fy as i64);

        let p00 = texel(ix, iy);
        let p10 = texel(ix + 1, iy);
        let p01 = texel(ix, iy + 1);
        let p11 = texel(ix + 1, iy + 1);

        let mut out = [0u8; 3];
        for c in 0..3 {
            let top = p00[c] * (1.0 - ax) + p10[c] * ax;
            let bottom = p01[c] * (1.0 - ax) + p11[c] * ax;
            out[c] = (top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    })
}
