use std::collections::HashMap;

use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{Connectivity, connected_components};
use log::{debug, info};

use super::{SegmentParams, Segmenter, select_masks};
use crate::error::{Error, Result};
use crate::models::{Mask, MaskResult};

/// Classical backend: Otsu threshold, then one region per 8-connected
/// component of the minority class.
pub struct ComponentSegmenter {
    /// Pre-threshold smoothing.
    pub sigma: f32,
    loaded: bool,
}

impl ComponentSegmenter {
    pub fn new() -> Self {
        Self {
            sigma: 1.5,
            loaded: false,
        }
    }

    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Foreground pixels are 255; whichever side of the Otsu level covers
    /// less of the image is taken as foreground.
    fn binarize(&self, image: &RgbImage) -> GrayImage {
        let gray = imageops::grayscale(image);
        let smoothed = if self.sigma > 0.0 {
            gaussian_blur_f32(&gray, self.sigma)
        } else {
            gray
        };

        let level = otsu_level(&smoothed);
        let bright = smoothed.pixels().filter(|p| p[0] > level).count();
        let total = (smoothed.width() * smoothed.height()) as usize;
        let bright_is_foreground = bright * 2 <= total;

        GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
            let is_bright = smoothed.get_pixel(x, y)[0] > level;
            if is_bright == bright_is_foreground {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

impl Default for ComponentSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for ComponentSegmenter {
    fn name(&self) -> &str {
        "components"
    }

    fn load(&mut self) -> Result<()> {
        info!("component segmenter loaded (sigma {})", self.sigma);
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn segment_auto(&self, image: &RgbImage, params: &SegmentParams) -> Result<Vec<MaskResult>> {
        if !self.loaded {
            return Err(Error::NotReady("component segmenter not loaded".to_string()));
        }

        let (w, h) = image.dimensions();
        let total_area = w as u64 * h as u64;
        if total_area == 0 {
            return Ok(Vec::new());
        }

        let binary = self.binarize(image);
        let labeled = connected_components(&binary, Connectivity::Eight, Luma([0]));

        let mut areas: HashMap<u32, u64> = HashMap::new();
        for label in labeled.pixels() {
            if label[0] == 0 {
                continue; // background
            }
            *areas.entry(label[0]).or_insert(0) += 1;
        }

        // Largest first; labels break ties so ids are deterministic
        let min_area = params.min_area(total_area);
        let mut regions: Vec<(u32, u64)> = areas
            .into_iter()
            .filter(|(_, area)| *area >= min_area)
            .collect();
        regions.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        regions.truncate(params.max_masks);

        debug!("{} components kept (min area {})", regions.len(), min_area);

        let candidates = regions
            .iter()
            .enumerate()
            .map(|(id, (label, _))| {
                let mask = Mask::from_fn(w, h, |x, y| labeled.get_pixel(x, y)[0] == *label);
                MaskResult::new(id as u32, mask)
            })
            .collect();

        Ok(select_masks(candidates, total_area, params))
    }
}
