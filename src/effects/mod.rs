pub mod compositor;
pub mod heatmap;
pub mod outline;

use image::RgbImage;

use crate::error::Result;
use crate::models::MaskResult;

pub use compositor::{Effect, apply_effect, composite_masks, composite_masks_with};
pub use heatmap::{heat_color, render_heatmap};
pub use outline::{outline_band, render_outline};

/// Check every mask against the image before any pixel is written.
pub(crate) fn ensure_masks_match(image: &RgbImage, masks: &[MaskResult]) -> Result<()> {
    for m in masks {
        m.mask().ensure_dimensions(image.width(), image.height())?;
    }
    Ok(())
}
