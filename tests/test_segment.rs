//! Integration tests for automatic segmentation.
//!
//! Tests cover:
//! - Component segmenter finds separate dark blobs on a light background
//! - Area ratio and count limits are applied
//! - Segment response shape and JSON encoding

mod common;

use common::*;
use image::Rgb;
use privmask::SegmentParams;
use privmask::config::{Config, SegmenterKind};
use privmask::models::SegmentResponse;

fn two_blobs() -> image::RgbImage {
    let mut img = solid_image(120, 90, Rgb([230, 230, 230]));
    for (x, y, p) in img.enumerate_pixels_mut() {
        let left = (10..40).contains(&x) && (10..40).contains(&y);
        let right = (70..110).contains(&x) && (40..80).contains(&y);
        if left || right {
            *p = Rgb([20, 20, 20]);
        }
    }
    img
}

fn components_pipeline() -> anyhow::Result<PrivacyPipeline> {
    let config = Config {
        segmenter: SegmenterKind::Components,
        ..Config::default()
    };
    Ok(PrivacyPipeline::from_config(&config)?)
}

#[test]
fn test_components_find_blobs() -> anyhow::Result<()> {
    let pipeline = components_pipeline()?;
    let img = two_blobs();

    let params = SegmentParams { min_area_ratio: 0.01, max_masks: 50 };
    let masks = pipeline.segment(&img, &params)?;
    assert_eq!(masks.len(), 2);

    let mut boxes: Vec<BoundingBox> = masks.iter().map(|m| m.bbox()).collect();
    boxes.sort_by_key(|b| b.x1);
    // Smoothing may shift the threshold edge by a pixel
    assert!(boxes[0].x1.abs_diff(10) <= 1 && boxes[0].x2.abs_diff(39) <= 1);
    assert!(boxes[1].y1.abs_diff(40) <= 1 && boxes[1].y2.abs_diff(79) <= 1);

    let mut ids: Vec<u32> = masks.iter().map(|m| m.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 2);

    Ok(())
}

#[test]
fn test_components_limits() -> anyhow::Result<()> {
    let pipeline = components_pipeline()?;
    let img = two_blobs();

    // Left blob covers ~8% of the image, right one ~15%
    let masks = pipeline.segment(&img, &SegmentParams { min_area_ratio: 0.1, max_masks: 50 })?;
    assert_eq!(masks.len(), 1);
    assert!(masks[0].bbox().x1 >= 69);

    let masks = pipeline.segment(&img, &SegmentParams { min_area_ratio: 0.0, max_masks: 1 })?;
    assert_eq!(masks.len(), 1);

    Ok(())
}

#[test]
fn test_segment_then_filter() -> anyhow::Result<()> {
    let pipeline = components_pipeline()?;
    let img = two_blobs();
    let params = FilterParams::new().with_blur_type(BlurType::Solid).with_fill_color(Rgb([255, 0, 0]));

    let outcome = pipeline.filter_auto(&img, &params)?;
    assert_eq!(outcome.applied_regions.len(), 2);
    assert_eq!(*outcome.image.get_pixel(25, 25), Rgb([255, 0, 0]));
    assert_eq!(*outcome.image.get_pixel(90, 60), Rgb([255, 0, 0]));
    assert_eq!(*outcome.image.get_pixel(60, 5), Rgb([230, 230, 230]));

    Ok(())
}

#[test]
fn test_segment_response_json() -> anyhow::Result<()> {
    let pipeline = mock_pipeline();
    let img = solid_image(64, 48, GRAY);
    let masks = pipeline.segment(&img, &FilterParams::default().segment_params())?;

    let response = SegmentResponse::new(img.width(), img.height(), &masks);
    let json = serde_json::to_value(&response)?;

    assert_eq!(json["image_size"], serde_json::json!([48, 64]));
    let first = &json["masks"][0];
    assert_eq!(first["mask_id"], 0);
    // Mock disk: center (32, 24), radius 12
    assert_eq!(first["bbox"], serde_json::json!([20, 12, 44, 36]));
    assert!(first["area"].as_u64().is_some_and(|a| a > 400));

    Ok(())
}
