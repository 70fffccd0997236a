use std::path::PathBuf;

use image::Rgb;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::segmentation::{ComponentSegmenter, MockSegmenter, SegmentParams, Segmenter};

/// Longest side accepted before input is downscaled.
pub const MAX_IMAGE_SIZE: u32 = 2048;
pub const DEFAULT_BLUR_STRENGTH: u32 = 21;

/// Masks smaller than this fraction of the image are dropped by segmenters.
pub const AUTO_MASK_MIN_AREA_RATIO: f64 = 0.01;
pub const AUTO_MASK_MAX_COUNT: usize = 50;

pub const DEFAULT_OUTLINE_WIDTH: u32 = 3;
pub const DEFAULT_HEATMAP_ALPHA: f32 = 0.6;
pub const DEFAULT_FILL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Destructive effect applied inside each mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BlurType {
    #[default]
    Gaussian,
    Pixelate,
    Solid,
}

/// Parameters of one filter call.
#[derive(Debug, Clone)]
pub struct FilterParams {
    pub blur_type: BlurType,
    pub blur_strength: u32,
    pub fill_color: Rgb<u8>,
    /// Forwarded to the segmenter by `filter_auto`; `filter` never drops masks.
    pub min_area_ratio: f64,
    pub max_masks: usize,
}

impl FilterParams {
    pub fn new() -> Self {
        Self {
            blur_type: BlurType::default(),
            blur_strength: DEFAULT_BLUR_STRENGTH,
            fill_color: DEFAULT_FILL_COLOR,
            min_area_ratio: AUTO_MASK_MIN_AREA_RATIO,
            max_masks: AUTO_MASK_MAX_COUNT,
        }
    }

    pub fn with_blur_type(mut self, blur_type: BlurType) -> Self {
        self.blur_type = blur_type;
        self
    }

    pub fn with_strength(mut self, strength: u32) -> Self {
        self.blur_strength = strength;
        self
    }

    pub fn with_fill_color(mut self, color: Rgb<u8>) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_min_area_ratio(mut self, ratio: f64) -> Self {
        self.min_area_ratio = ratio;
        self
    }

    pub fn with_max_masks(mut self, max_masks: usize) -> Self {
        self.max_masks = max_masks;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.blur_type == BlurType::Gaussian && self.blur_strength == 0 {
            return Err(Error::InvalidStrength(self.blur_strength));
        }
        if !(0.0..=1.0).contains(&self.min_area_ratio) {
            return Err(Error::InvalidMinAreaRatio(self.min_area_ratio));
        }
        Ok(())
    }

    pub fn segment_params(&self) -> SegmentParams {
        SegmentParams {
            min_area_ratio: self.min_area_ratio,
            max_masks: self.max_masks,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-destructive preview renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewKind {
    Outline { width: u32 },
    Heatmap { alpha: f32 },
}

impl PreviewKind {
    pub fn outline() -> Self {
        PreviewKind::Outline {
            width: DEFAULT_OUTLINE_WIDTH,
        }
    }

    pub fn heatmap() -> Self {
        PreviewKind::Heatmap {
            alpha: DEFAULT_HEATMAP_ALPHA,
        }
    }
}

/// Which segmentation backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SegmenterKind {
    /// Fixed centered disk, no model needed
    #[default]
    Mock,
    /// Otsu threshold + connected components
    Components,
}

impl SegmenterKind {
    pub fn build(self) -> Box<dyn Segmenter> {
        match self {
            SegmenterKind::Mock => Box::new(MockSegmenter::new()),
            SegmenterKind::Components => Box::new(ComponentSegmenter::new()),
        }
    }
}

/// Process-level settings assembled by the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub segmenter: SegmenterKind,
    pub max_image_size: u32,
    pub debug_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segmenter: SegmenterKind::default(),
            max_image_size: MAX_IMAGE_SIZE,
            debug_dir: None,
        }
    }
}
