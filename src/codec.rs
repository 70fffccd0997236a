use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::{Error, Result};
use crate::models::Mask;

/// Decode any supported format, forcing 3-channel RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Decode a base64 payload, with or without a `data:<mime>;base64,` prefix.
pub fn decode_base64(encoded: &str) -> Result<RgbImage> {
    let payload = match encoded.split_once(',') {
        Some((_, rest)) => rest,
        None => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Decode(e.to_string()))?;
    decode(&bytes)
}

/// Decode a mask image; any non-zero luma value is inside.
pub fn decode_mask(bytes: &[u8]) -> Result<Mask> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(Mask::from_gray(&img.to_luma8()))
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(buffer)
}

/// PNG wrapped as a `data:image/png;base64,...` URI.
pub fn encode_data_uri(image: &RgbImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Shrink so the longer side is at most `max_dimension`, keeping the aspect
/// ratio. Returns the image and the scale applied (1.0 when untouched).
pub fn resize_if_needed(image: RgbImage, max_dimension: u32) -> Result<(RgbImage, f64)> {
    if max_dimension == 0 {
        return Err(Error::InvalidMaxDimension);
    }

    let (w, h) = image.dimensions();
    let longer = w.max(h);
    if longer <= max_dimension {
        return Ok((image, 1.0));
    }

    let scale = max_dimension as f64 / longer as f64;
    let new_w = ((w as f64 * scale) as u32).max(1);
    let new_h = ((h as f64 * scale) as u32).max(1);
    let resized = imageops::resize(&image, new_w, new_h, FilterType::Lanczos3);
    Ok((resized, scale))
}
