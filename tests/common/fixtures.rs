use image::{Rgb, RgbImage};
use privmask::segmentation::MockSegmenter;
use privmask::{Mask, MaskResult, PrivacyPipeline};

/// Color constants for tests
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

/// Creates a uniform image of the given color.
pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// Creates an RGB gradient image (red along x, green along y).
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Creates a black/white checkerboard with square cells of `cell` pixels.
pub fn checker_image(width: u32, height: u32, cell: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            BLACK
        }
    })
}

/// Creates a disk-shaped region of the given radius.
pub fn disk(id: u32, width: u32, height: u32, cx: i64, cy: i64, radius: u32) -> MaskResult {
    MaskResult::new(id, Mask::circle(width, height, cx, cy, radius))
}

/// Creates a pipeline backed by a loaded mock segmenter.
pub fn mock_pipeline() -> PrivacyPipeline {
    let mut pipeline = PrivacyPipeline::new(Box::new(MockSegmenter::new()));
    pipeline.load().expect("mock segmenter should load");
    pipeline
}
