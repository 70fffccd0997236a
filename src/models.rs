use image::{GrayImage, Luma};
use serde::Serialize;

use crate::error::{Error, Result};

const INSIDE: Luma<u8> = Luma([255]);
const OUTSIDE: Luma<u8> = Luma([0]);

/// Axis-aligned box `(x1, y1, x2, y2)`, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "[u32; 4]")]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1 + 1
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Boolean grid marking the pixels of one region.
///
/// Backed by an 8-bit luma buffer holding 0 (outside) or 255 (inside) so it can
/// be handed to `imageproc` morphology without conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    /// All-outside mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    pub fn from_fn(width: u32, height: u32, mut inside: impl FnMut(u32, u32) -> bool) -> Self {
        Self {
            pixels: GrayImage::from_fn(width, height, |x, y| {
                if inside(x, y) { INSIDE } else { OUTSIDE }
            }),
        }
    }

    /// Any non-zero pixel counts as inside.
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self::from_fn(gray.width(), gray.height(), |x, y| gray.get_pixel(x, y)[0] != 0)
    }

    /// Filled disk: `(x - cx)² + (y - cy)² <= r²`.
    pub fn circle(width: u32, height: u32, cx: i64, cy: i64, radius: u32) -> Self {
        let r2 = radius as i64 * radius as i64;
        Self::from_fn(width, height, |x, y| {
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            dx * dx + dy * dy <= r2
        })
    }

    /// Filled rectangle with inclusive corners, clipped to the grid.
    pub fn rect(width: u32, height: u32, bbox: BoundingBox) -> Self {
        Self::from_fn(width, height, |x, y| {
            x >= bbox.x1 && x <= bbox.x2 && y >= bbox.y1 && y <= bbox.y2
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] != 0
    }

    /// Number of inside cells.
    pub fn count(&self) -> u32 {
        self.pixels.pixels().filter(|p| p[0] != 0).count() as u32
    }

    pub fn is_empty(&self) -> bool {
        !self.pixels.pixels().any(|p| p[0] != 0)
    }

    /// Coordinates of every inside cell, row-major.
    pub fn inside(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.pixels
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| (x, y))
    }

    /// Tight box around the inside cells, `None` for an empty mask.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut found: Option<BoundingBox> = None;
        for (x, y) in self.inside() {
            found = Some(match found {
                None => BoundingBox { x1: x, y1: y, x2: x, y2: y },
                Some(b) => BoundingBox {
                    x1: b.x1.min(x),
                    y1: b.y1.min(y),
                    x2: b.x2.max(x),
                    y2: b.y2.max(y),
                },
            });
        }
        found
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    /// Fails unless the mask covers exactly a `width` x `height` image.
    pub fn ensure_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if self.dimensions() != (width, height) {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: self.dimensions(),
            });
        }
        Ok(())
    }
}

/// One detected region as returned by a segmenter.
///
/// `bbox` and `area` are derived from the mask on construction.
#[derive(Debug, Clone)]
pub struct MaskResult {
    id: u32,
    mask: Mask,
    bbox: BoundingBox,
    area: u32,
    score: f32,
}

impl MaskResult {
    pub fn new(id: u32, mask: Mask) -> Self {
        let bbox = mask.bounding_box().unwrap_or_default();
        let area = mask.count();
        Self {
            id,
            mask,
            bbox,
            area,
            score: 1.0,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score.clamp(0.0, 1.0);
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn area(&self) -> u32 {
        self.area
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Audit record of one effect application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRegion {
    pub mask_id: u32,
    pub bbox: BoundingBox,
    pub area: u32,
}

impl From<&MaskResult> for AppliedRegion {
    fn from(m: &MaskResult) -> Self {
        Self {
            mask_id: m.id(),
            bbox: m.bbox(),
            area: m.area(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MaskInfo {
    pub mask_id: u32,
    pub bbox: BoundingBox,
    pub area: u32,
    pub score: f32,
}

impl From<&MaskResult> for MaskInfo {
    fn from(m: &MaskResult) -> Self {
        Self {
            mask_id: m.id(),
            bbox: m.bbox(),
            area: m.area(),
            score: m.score(),
        }
    }
}

/// Masks found in an image; `image_size` is `[height, width]`.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentResponse {
    pub masks: Vec<MaskInfo>,
    pub image_size: [u32; 2],
}

impl SegmentResponse {
    pub fn new(width: u32, height: u32, masks: &[MaskResult]) -> Self {
        Self {
            masks: masks.iter().map(MaskInfo::from).collect(),
            image_size: [height, width],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterResponse {
    /// PNG data URI of the filtered image.
    pub filtered_image_base64: String,
    pub applied_regions: Vec<AppliedRegion>,
    /// Factor the input was downscaled by before filtering.
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub mode: String,
    pub model_loaded: bool,
    pub backend: &'static str,
}
