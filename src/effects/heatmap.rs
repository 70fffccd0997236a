use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use log::debug;

use crate::error::{Error, Result};
use crate::models::{Mask, MaskResult};

/// Cool-to-warm ramp sampled at 0, 0.25, 0.5, 0.75 and 1.
const HEAT_STOPS: [[f32; 3]; 5] = [
    [0.0, 0.0, 255.0],   // blue
    [0.0, 255.0, 255.0], // cyan
    [0.0, 255.0, 0.0],   // green
    [255.0, 255.0, 0.0], // yellow
    [255.0, 128.0, 0.0], // orange
];

/// Euclidean distance from every inside cell to the nearest outside cell,
/// row-major. Cells beyond the grid count as outside; outside cells are 0.
pub fn distance_field(mask: &Mask) -> Vec<f32> {
    let (w, h) = mask.dimensions();

    // Outside cells (and a one-pixel frame) are the foreground we measure to
    let mut outside = GrayImage::from_pixel(w + 2, h + 2, Luma([255]));
    for (x, y) in mask.inside() {
        outside.put_pixel(x + 1, y + 1, Luma([0]));
    }
    let squared = euclidean_squared_distance_transform(&outside);

    let mut field = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let d = if mask.get(x, y) {
                squared.get_pixel(x + 1, y + 1)[0].sqrt() as f32
            } else {
                0.0
            };
            field.push(d);
        }
    }
    field
}

/// Piecewise-linear lookup in the heat ramp; `t` is clamped to `[0, 1]`.
pub fn heat_color(t: f32) -> [f32; 3] {
    let index = t.clamp(0.0, 1.0) * 4.0;
    let lower = index.floor() as usize;
    let upper = (index.ceil() as usize).min(HEAT_STOPS.len() - 1);
    let frac = index - lower as f32;

    let lo = HEAT_STOPS[lower];
    let hi = HEAT_STOPS[upper];
    [
        lo[0] * (1.0 - frac) + hi[0] * frac,
        lo[1] * (1.0 - frac) + hi[1] * frac,
        lo[2] * (1.0 - frac) + hi[2] * frac,
    ]
}

fn validate_alpha(alpha: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidAlpha(alpha));
    }
    Ok(())
}

/// Blend a depth gradient into each mask: blue at the edge, orange at the
/// deepest point. Masks are blended in order onto one float buffer which is
/// rounded and saturated once at the end.
pub fn render_heatmap(image: &RgbImage, masks: &[MaskResult], alpha: f32) -> Result<RgbImage> {
    super::ensure_masks_match(image, masks)?;
    validate_alpha(alpha)?;

    let (w, h) = image.dimensions();
    let mut canvas: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();

    for m in masks {
        if m.area() == 0 {
            continue;
        }

        let field = distance_field(m.mask());
        let max = field.iter().cloned().fold(0.0_f32, f32::max);

        for (x, y) in m.mask().inside() {
            let i = (y * w + x) as usize;
            let d = if max > 0.0 { field[i] / max } else { field[i] };
            let heat = heat_color(d);
            let base = &mut canvas[i];
            for c in 0..3 {
                base[c] = base[c] * (1.0 - alpha) + heat[c] * alpha;
            }
        }
        debug!("heatmap for mask {} (max depth {:.1})", m.id(), max);
    }

    Ok(RgbImage::from_fn(w, h, |x, y| {
        let p = canvas[(y * w + x) as usize];
        Rgb([quantize(p[0]), quantize(p[1]), quantize(p[2])])
    }))
}

fn quantize(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
