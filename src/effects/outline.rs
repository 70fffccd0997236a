use image::imageops;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use log::debug;

use crate::error::{Error, Result};
use crate::models::{Mask, MaskResult};

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

fn erosion_steps(width: u32) -> Result<u8> {
    match u8::try_from(width) {
        Ok(k) if k > 0 => Ok(k),
        _ => Err(Error::InvalidOutlineWidth(width)),
    }
}

/// Band of cells that `width` erosions with the 4-connected cross remove.
///
/// Cells beyond the grid count as outside, so a mask touching the image edge
/// gets a band along that edge too. If erosion removes everything the band is
/// the whole mask.
pub fn outline_band(mask: &Mask, width: u32) -> Result<Mask> {
    let k = erosion_steps(width)?;
    if mask.is_empty() {
        return Ok(mask.clone());
    }

    let (w, h) = mask.dimensions();
    let mut padded = GrayImage::new(w + 2, h + 2);
    imageops::replace(&mut padded, mask.as_gray(), 1, 1);

    // L1 radius k is k passes of the unit cross
    let eroded = morphology::erode(&padded, Norm::L1, k);

    Ok(Mask::from_fn(w, h, |x, y| {
        mask.get(x, y) && eroded.get_pixel(x + 1, y + 1)[0] == 0
    }))
}

/// Preview with each mask's border band painted yellow; interiors and
/// everything outside the masks keep their original pixels.
pub fn render_outline(image: &RgbImage, masks: &[MaskResult], width: u32) -> Result<RgbImage> {
    super::ensure_masks_match(image, masks)?;
    erosion_steps(width)?;

    let mut preview = image.clone();
    for m in masks {
        let band = outline_band(m.mask(), width)?;
        for (x, y) in band.inside() {
            preview.put_pixel(x, y, OUTLINE_COLOR);
        }
        debug!("outlined mask {} ({} border pixels)", m.id(), band.count());
    }
    Ok(preview)
}
