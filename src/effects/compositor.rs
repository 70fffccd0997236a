use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use log::debug;

use crate::config::{BlurType, FilterParams};
use crate::error::{Error, Result};
use crate::models::{Mask, MaskResult};

/// Smallest pixelation block, whatever the requested strength.
const MIN_BLOCK_SIZE: u32 = 4;

/// Destructive effect written into a mask's footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Sigma of the full-image gaussian blur.
    GaussianBlur { strength: u32 },
    /// Block edge is `max(4, strength)` pixels.
    Pixelate { strength: u32 },
    Solid { color: Rgb<u8> },
}

impl Effect {
    pub fn from_params(params: &FilterParams) -> Self {
        match params.blur_type {
            BlurType::Gaussian => Effect::GaussianBlur {
                strength: params.blur_strength,
            },
            BlurType::Pixelate => Effect::Pixelate {
                strength: params.blur_strength,
            },
            BlurType::Solid => Effect::Solid {
                color: params.fill_color,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Effect::GaussianBlur { strength: 0 } => Err(Error::InvalidStrength(0)),
            _ => Ok(()),
        }
    }
}

fn copy_masked(target: &mut RgbImage, source: &RgbImage, mask: &Mask) {
    for (x, y) in mask.inside() {
        target.put_pixel(x, y, *source.get_pixel(x, y));
    }
}

/// Blur the whole image, then keep the blurred pixels inside the mask only.
///
/// Pixels near the mask edge pick up color from just outside it, since the
/// kernel is never truncated at the mask boundary.
pub fn gaussian_blur_fill(image: &RgbImage, mask: &Mask, strength: u32) -> Result<RgbImage> {
    let mut result = image.clone();
    apply_effect_in_place(&mut result, mask, &Effect::GaussianBlur { strength })?;
    Ok(result)
}

/// Nearest-neighbour downsample then upsample, kept inside the mask only.
pub fn pixelate_fill(image: &RgbImage, mask: &Mask, strength: u32) -> Result<RgbImage> {
    let mut result = image.clone();
    apply_effect_in_place(&mut result, mask, &Effect::Pixelate { strength })?;
    Ok(result)
}

pub fn solid_fill(image: &RgbImage, mask: &Mask, color: Rgb<u8>) -> Result<RgbImage> {
    let mut result = image.clone();
    apply_effect_in_place(&mut result, mask, &Effect::Solid { color })?;
    Ok(result)
}

fn pixelate(image: &RgbImage, strength: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let block = strength.max(MIN_BLOCK_SIZE);
    let small_w = (width / block).max(1);
    let small_h = (height / block).max(1);

    let small = imageops::resize(image, small_w, small_h, FilterType::Nearest);
    imageops::resize(&small, width, height, FilterType::Nearest)
}

/// Apply `effect` inside `mask`, writing into `image`.
pub fn apply_effect_in_place(image: &mut RgbImage, mask: &Mask, effect: &Effect) -> Result<()> {
    mask.ensure_dimensions(image.width(), image.height())?;
    effect.validate()?;

    if mask.is_empty() {
        return Ok(());
    }

    match *effect {
        Effect::GaussianBlur { strength } => {
            let blurred = gaussian_blur_f32(image, strength as f32);
            copy_masked(image, &blurred, mask);
        }
        Effect::Pixelate { strength } => {
            let pixelated = pixelate(image, strength);
            copy_masked(image, &pixelated, mask);
        }
        Effect::Solid { color } => {
            for (x, y) in mask.inside() {
                image.put_pixel(x, y, color);
            }
        }
    }

    Ok(())
}

pub fn apply_effect(image: &RgbImage, mask: &Mask, effect: &Effect) -> Result<RgbImage> {
    let mut result = image.clone();
    apply_effect_in_place(&mut result, mask, effect)?;
    Ok(result)
}

/// Fold `effect` over `masks` in list order; later masks overwrite earlier
/// ones where they overlap.
pub fn composite_masks(image: &RgbImage, masks: &[MaskResult], effect: &Effect) -> Result<RgbImage> {
    composite_masks_with(image, masks, effect, |_, _, _| Ok(()))
}

/// [`composite_masks`], calling `on_step` with the mask index, the mask and
/// the running result after each mask is applied.
pub fn composite_masks_with<F>(
    image: &RgbImage,
    masks: &[MaskResult],
    effect: &Effect,
    mut on_step: F,
) -> Result<RgbImage>
where
    F: FnMut(usize, &MaskResult, &RgbImage) -> Result<()>,
{
    super::ensure_masks_match(image, masks)?;
    effect.validate()?;

    let mut result = image.clone();
    for (idx, m) in masks.iter().enumerate() {
        apply_effect_in_place(&mut result, m.mask(), effect)?;
        debug!("applied {:?} to mask {} (area {})", effect, m.id(), m.area());
        on_step(idx, m, &result)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ])
        })
    }

    fn assert_unchanged_outside(input: &RgbImage, output: &RgbImage, mask: &Mask) {
        for (x, y, p) in output.enumerate_pixels() {
            if !mask.get(x, y) {
                assert_eq!(p, input.get_pixel(x, y), "pixel ({}, {}) changed", x, y);
            }
        }
    }

    #[test]
    fn solid_fill_paints_exactly_the_mask() {
        let img = gradient(32, 24);
        let mask = Mask::circle(32, 24, 16, 12, 6);
        let out = solid_fill(&img, &mask, Rgb([10, 20, 30])).unwrap();

        for (x, y, p) in out.enumerate_pixels() {
            if mask.get(x, y) {
                assert_eq!(*p, Rgb([10, 20, 30]));
            } else {
                assert_eq!(p, img.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn blur_leaves_outside_untouched() {
        let img = gradient(40, 40);
        let mask = Mask::rect(40, 40, BoundingBox { x1: 10, y1: 10, x2: 29, y2: 29 });
        let out = gaussian_blur_fill(&img, &mask, 3).unwrap();
        assert_unchanged_outside(&img, &out, &mask);
    }

    #[test]
    fn blur_changes_masked_edges() {
        // Hard black/white edge inside the mask gets smoothed
        let img = RgbImage::from_fn(40, 20, |x, _| if x < 20 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let mask = Mask::rect(40, 20, BoundingBox { x1: 15, y1: 0, x2: 24, y2: 19 });
        let out = gaussian_blur_fill(&img, &mask, 3).unwrap();
        let left = out.get_pixel(19, 10)[0];
        let right = out.get_pixel(20, 10)[0];
        assert!(left > 0 && left < 255);
        assert!(right > 0 && right < 255);
    }

    #[test]
    fn zero_strength_blur_rejected() {
        let img = gradient(8, 8);
        let mask = Mask::circle(8, 8, 4, 4, 2);
        assert!(matches!(gaussian_blur_fill(&img, &mask, 0), Err(Error::InvalidStrength(0))));
    }

    #[test]
    fn pixelate_produces_uniform_blocks() {
        let img = gradient(64, 64);
        let mask = Mask::from_fn(64, 64, |_, _| true);
        let out = pixelate_fill(&img, &mask, 16).unwrap();

        // 64 / 16 = 4 blocks per axis, each a single color
        for by in 0..4 {
            for bx in 0..4 {
                let first = *out.get_pixel(bx * 16, by * 16);
                for y in by * 16..(by + 1) * 16 {
                    for x in bx * 16..(bx + 1) * 16 {
                        assert_eq!(*out.get_pixel(x, y), first);
                    }
                }
            }
        }
    }

    #[test]
    fn pixelate_small_image_collapses_to_one_block() {
        let img = gradient(6, 5);
        let mask = Mask::from_fn(6, 5, |_, _| true);
        let out = pixelate_fill(&img, &mask, 21).unwrap();
        let first = *out.get_pixel(0, 0);
        assert!(out.pixels().all(|p| *p == first));
    }

    #[test]
    fn pixelate_leaves_outside_untouched() {
        let img = gradient(50, 30);
        let mask = Mask::circle(50, 30, 25, 15, 10);
        let out = pixelate_fill(&img, &mask, 5).unwrap();
        assert_unchanged_outside(&img, &out, &mask);
    }

    #[test]
    fn empty_mask_is_noop() {
        let img = gradient(16, 16);
        let mask = Mask::new(16, 16);
        for effect in [
            Effect::GaussianBlur { strength: 5 },
            Effect::Pixelate { strength: 5 },
            Effect::Solid { color: Rgb([1, 2, 3]) },
        ] {
            assert_eq!(apply_effect(&img, &mask, &effect).unwrap(), img);
        }
    }

    #[test]
    fn mismatched_mask_rejected() {
        let img = gradient(16, 16);
        let mask = Mask::circle(16, 12, 8, 6, 3);
        let result = solid_fill(&img, &mask, Rgb([0, 0, 0]));
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn last_mask_wins_on_overlap() {
        let img = RgbImage::from_pixel(20, 10, Rgb([100, 100, 100]));
        let a = MaskResult::new(0, Mask::rect(20, 10, BoundingBox { x1: 0, y1: 0, x2: 11, y2: 9 }));
        let b = MaskResult::new(1, Mask::rect(20, 10, BoundingBox { x1: 8, y1: 0, x2: 19, y2: 9 }));

        let red = composite_masks(&img, &[a.clone()], &Effect::Solid { color: Rgb([255, 0, 0]) }).unwrap();
        let out = composite_masks(&red, &[b], &Effect::Solid { color: Rgb([0, 0, 255]) }).unwrap();

        assert_eq!(*out.get_pixel(2, 5), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(10, 5), Rgb([0, 0, 255]));
        assert_eq!(*out.get_pixel(18, 5), Rgb([0, 0, 255]));
    }

    #[test]
    fn composite_checks_all_masks_first() {
        let img = RgbImage::from_pixel(10, 10, Rgb([100, 100, 100]));
        let good = MaskResult::new(0, Mask::circle(10, 10, 5, 5, 2));
        let bad = MaskResult::new(1, Mask::circle(9, 10, 5, 5, 2));
        let result = composite_masks(&img, &[good, bad], &Effect::Solid { color: Rgb([0, 0, 0]) });
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn step_callback_sees_running_result() {
        let img = RgbImage::from_pixel(12, 6, Rgb([100, 100, 100]));
        let a = MaskResult::new(3, Mask::rect(12, 6, BoundingBox { x1: 0, y1: 0, x2: 7, y2: 5 }));
        let b = MaskResult::new(9, Mask::rect(12, 6, BoundingBox { x1: 4, y1: 0, x2: 11, y2: 5 }));
        let effect = Effect::Solid { color: Rgb([0, 0, 0]) };

        let mut steps = Vec::new();
        let out = composite_masks_with(&img, &[a.clone(), b.clone()], &effect, |idx, m, partial| {
            steps.push((idx, m.id(), *partial.get_pixel(10, 3)));
            Ok(())
        })
        .unwrap();

        assert_eq!(steps, vec![(0, 3, Rgb([100, 100, 100])), (1, 9, Rgb([0, 0, 0]))]);
        assert_eq!(out, composite_masks(&img, &[a, b], &effect).unwrap());
    }
}
