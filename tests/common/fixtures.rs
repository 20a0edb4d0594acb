use cardscan::{Catalog, FeatureExtractor, RecognitionConfig};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Card dimensions used across tests (portrait)
pub const CARD_WIDTH: u32 = 100;
pub const CARD_HEIGHT: u32 = 140;
const CARD_MARGIN: u32 = 12;

/// Small deterministic generator so fixtures never change between runs
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 8
    }

    fn range(&mut self, lo: u32, hi: u32) -> u32 {
        lo + self.next() % (hi - lo)
    }
}

/// A white-bordered card with a seed-specific pattern of filled rectangles
pub fn textured_card(seed: u32) -> RgbImage {
    let mut card = RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, Rgb([240, 240, 240]));
    let inner_w = CARD_WIDTH - 2 * CARD_MARGIN;
    let inner_h = CARD_HEIGHT - 2 * CARD_MARGIN;
    let mut rng = Lcg(seed.wrapping_mul(2_654_435_761).wrapping_add(17));

    draw_filled_rect_mut(
        &mut card,
        Rect::at(CARD_MARGIN as i32, CARD_MARGIN as i32).of_size(inner_w, inner_h),
        Rgb([128, 128, 128]),
    );

    for _ in 0..60 {
        let w = rng.range(4, 18);
        let h = rng.range(4, 18);
        let x = CARD_MARGIN + rng.range(0, inner_w - w);
        let y = CARD_MARGIN + rng.range(0, inner_h - h);
        let level = if rng.next() % 2 == 0 {
            rng.range(10, 70) as u8
        } else {
            rng.range(180, 250) as u8
        };
        draw_filled_rect_mut(
            &mut card,
            Rect::at(x as i32, y as i32).of_size(w, h),
            Rgb([level, level, level / 2 + 40]),
        );
    }
    card
}

/// A featureless card; yields no keypoints
pub fn blank_card() -> RgbImage {
    RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, Rgb([255, 255, 255]))
}

/// Uniform dark frame with `card` pasted at (x, y)
pub fn frame_with_card(card: &RgbImage, width: u32, height: u32, x: i64, y: i64) -> RgbImage {
    let mut frame = RgbImage::from_pixel(width, height, Rgb([30, 30, 30]));
    imageops::replace(&mut frame, card, x, y);
    frame
}

pub fn label(i: usize) -> String {
    format!("card-{}", i)
}

/// `count` textured references labelled `card-0`, `card-1`, ...
pub fn references(count: usize) -> Vec<(RgbImage, String)> {
    (0..count)
        .map(|i| (textured_card(i as u32 + 1), label(i)))
        .collect()
}

/// Configuration for tests: frames are processed at their native size
pub fn test_config() -> RecognitionConfig {
    RecognitionConfig::default().with_input_scale(1.0)
}

pub fn test_catalog(count: usize) -> (Catalog, FeatureExtractor) {
    let extractor = FeatureExtractor::new(&test_config());
    let catalog = Catalog::build(references(count), &extractor);
    (catalog, extractor)
}
