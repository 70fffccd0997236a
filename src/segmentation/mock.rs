use image::RgbImage;
use log::info;

use super::{SegmentParams, Segmenter, select_masks};
use crate::error::{Error, Result};
use crate::models::{Mask, MaskResult};

const MOCK_SCORE: f32 = 0.95;

/// Stand-in backend returning one disk centered in the image, radius a
/// quarter of the shorter side.
pub struct MockSegmenter {
    loaded: bool,
}

impl MockSegmenter {
    pub fn new() -> Self {
        Self { loaded: false }
    }
}

impl Default for MockSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for MockSegmenter {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&mut self) -> Result<()> {
        info!("mock segmenter loaded");
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn segment_auto(&self, image: &RgbImage, params: &SegmentParams) -> Result<Vec<MaskResult>> {
        if !self.loaded {
            return Err(Error::NotReady("mock segmenter not loaded".to_string()));
        }

        let (w, h) = image.dimensions();
        let radius = w.min(h) / 4;
        let mask = Mask::circle(w, h, (w / 2) as i64, (h / 2) as i64, radius);
        let disk = MaskResult::new(0, mask).with_score(MOCK_SCORE);

        Ok(select_masks(vec![disk], w as u64 * h as u64, params))
    }
}
