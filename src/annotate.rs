use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::point::Point;
use std::path::Path;
use std::sync::OnceLock;

use crate::detection::{contours, is_card_shape};
use crate::models::{MatchResult, Overlay};

/// DejaVu Sans Mono, used when no other font is configured
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");

fn bundled_font() -> FontArc {
    static FONT: OnceLock<FontArc> = OnceLock::new();
    FONT.get_or_init(|| {
        FontArc::try_from_slice(BUNDLED_FONT).expect("bundled font is a valid TrueType file")
    })
    .clone()
}

/// Draws outlines and labels of accepted card regions
#[derive(Clone)]
pub struct Annotator {
    pub color: Rgb<u8>,
    pub text_scale: f32,
    font: FontArc,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            text_scale: 14.0,
            font: bundled_font(),
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = font;
        self
    }

    /// Load a TrueType/OpenType font used to render labels
    pub fn with_font_file(self, path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read font {}: {}", path.display(), e))?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {}", path.display(), e))?;
        Ok(self.with_font(font))
    }

    /// Outline `polygon` and put the match label at its centroid.
    ///
    /// Only convex quadrilaterals are drawn; anything else leaves `canvas`
    /// untouched and returns `None`.
    pub fn annotate(
        &self,
        canvas: &mut RgbImage,
        polygon: &[Point<i32>],
        result: &MatchResult,
    ) -> Option<Overlay> {
        if !is_card_shape(polygon) {
            return None;
        }
        let (cx, cy) = contours::polygon_centroid(polygon)?;

        for (i, start) in polygon.iter().enumerate() {
            let end = polygon[(i + 1) % polygon.len()];
            draw_line_segment_mut(
                canvas,
                (start.x as f32, start.y as f32),
                (end.x as f32, end.y as f32),
                self.color,
            );
        }

        // Label box centered on the centroid
        let scale = PxScale::from(self.text_scale);
        let (text_w, text_h) = text_size(scale, &self.font, &result.label);
        let x = cx.round() as i32 - (text_w / 2) as i32;
        let y = cy.round() as i32 - (text_h / 2) as i32;
        draw_text_mut(canvas, self.color, x, y, scale, &self.font, &result.label);

        Some(Overlay {
            polygon: polygon.to_vec(),
            label: result.label.clone(),
            confidence: result.confidence,
        })
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}
