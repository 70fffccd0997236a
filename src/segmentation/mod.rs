pub mod components;
pub mod mock;

use image::RgbImage;

use crate::error::Result;
use crate::models::MaskResult;

pub use components::ComponentSegmenter;
pub use mock::MockSegmenter;

/// Filtering applied by every segmenter to its candidate regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentParams {
    /// Candidates covering less than this fraction of the image are dropped.
    pub min_area_ratio: f64,
    /// Cap on returned regions, highest score first.
    pub max_masks: usize,
}

impl SegmentParams {
    /// Smallest area kept for an image of `total_area` pixels.
    pub fn min_area(&self, total_area: u64) -> u64 {
        (total_area as f64 * self.min_area_ratio).floor() as u64
    }
}

/// Produces region masks for an image.
///
/// Implementations must be loaded before `segment_auto` is called and must
/// return masks with the image's dimensions and ids unique within the call.
pub trait Segmenter: Send + Sync {
    /// Short backend identifier, reported as the health "mode".
    fn name(&self) -> &str;

    fn load(&mut self) -> Result<()>;

    fn is_loaded(&self) -> bool;

    /// Segment the whole image without prompts.
    fn segment_auto(&self, image: &RgbImage, params: &SegmentParams) -> Result<Vec<MaskResult>>;
}

/// Drop undersized candidates, order by descending score (stable) and
/// truncate to `max_masks`.
pub fn select_masks(
    mut candidates: Vec<MaskResult>,
    total_area: u64,
    params: &SegmentParams,
) -> Vec<MaskResult> {
    let min_area = params.min_area(total_area);
    candidates.retain(|m| m.area() as u64 >= min_area);
    candidates.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(params.max_masks);
    candidates
}
