use std::path::PathBuf;

use image::RgbImage;
use log::{debug, info, warn};

use crate::codec;
use crate::config::{Config, FilterParams, PreviewKind};
use crate::effects::compositor::{Effect, composite_masks_with};
use crate::effects::{self, ensure_masks_match};
use crate::error::{Error, Result};
use crate::models::{AppliedRegion, FilterResponse, HealthReport, MaskResult};
use crate::segmentation::{SegmentParams, Segmenter};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Receives `00_input.png` and one image per applied mask
    pub output_dir: PathBuf,
}

/// Filtered image plus one record per mask, in input order.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub image: RgbImage,
    pub applied_regions: Vec<AppliedRegion>,
}

impl FilterOutcome {
    /// Encode for transport; `scale` is the factor the input was resized by.
    pub fn to_response(&self, scale: f64) -> Result<FilterResponse> {
        Ok(FilterResponse {
            filtered_image_base64: codec::encode_data_uri(&self.image)?,
            applied_regions: self.applied_regions.clone(),
            scale,
        })
    }
}

/// Entry point routing images and masks to the compositor or a preview
/// renderer. The segmenter is injected and only consulted by
/// [`PrivacyPipeline::segment`] and [`PrivacyPipeline::filter_auto`].
pub struct PrivacyPipeline {
    segmenter: Box<dyn Segmenter>,
    debug: Option<DebugConfig>,
}

impl PrivacyPipeline {
    pub fn new(segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            segmenter,
            debug: None,
        }
    }

    /// Build the configured segmenter, load it and apply the debug directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut pipeline = Self::new(config.segmenter.build());
        pipeline.load()?;
        if let Some(dir) = &config.debug_dir {
            pipeline = pipeline.with_debug(dir.clone())?;
        }
        Ok(pipeline)
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(Error::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn load(&mut self) -> Result<()> {
        self.segmenter.load()
    }

    pub fn is_ready(&self) -> bool {
        self.segmenter.is_loaded()
    }

    pub fn health(&self) -> HealthReport {
        let loaded = self.is_ready();
        HealthReport {
            status: if loaded { "ok" } else { "model_not_loaded" },
            mode: self.segmenter.name().to_string(),
            model_loaded: loaded,
            backend: "cli",
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::NotReady(format!(
                "{} segmenter has not been loaded",
                self.segmenter.name()
            )));
        }
        Ok(())
    }

    /// Masks the segmenter finds in `image`.
    pub fn segment(&self, image: &RgbImage, params: &SegmentParams) -> Result<Vec<MaskResult>> {
        self.ensure_ready()?;
        let masks = self.segmenter.segment_auto(image, params)?;
        ensure_masks_match(image, &masks)?;
        info!("{} segmenter returned {} masks", self.segmenter.name(), masks.len());
        Ok(masks)
    }

    /// Apply the configured effect to every mask in order. Masks are not
    /// filtered here; every mask yields one applied region.
    pub fn filter(
        &self,
        image: &RgbImage,
        masks: &[MaskResult],
        params: &FilterParams,
    ) -> Result<FilterOutcome> {
        params.validate()?;
        ensure_masks_match(image, masks)?;

        let effect = Effect::from_params(params);
        self.save_debug_image(image, "00_input.png")?;

        let mut applied_regions = Vec::with_capacity(masks.len());
        let result = composite_masks_with(image, masks, &effect, |idx, m, partial| {
            if m.area() == 0 {
                warn!("mask {} is empty, nothing to filter", m.id());
            }
            applied_regions.push(AppliedRegion::from(m));

            let filename = format!("{:02}_mask-{}.png", idx + 1, m.id());
            self.save_debug_image(partial, &filename)
        })?;

        info!(
            "filtered {}x{} image, {} regions ({:?})",
            image.width(),
            image.height(),
            applied_regions.len(),
            params.blur_type
        );

        Ok(FilterOutcome {
            image: result,
            applied_regions,
        })
    }

    /// Segment, then filter every region returned.
    pub fn filter_auto(&self, image: &RgbImage, params: &FilterParams) -> Result<FilterOutcome> {
        params.validate()?;
        let masks = self.segment(image, &params.segment_params())?;
        self.filter(image, &masks, params)
    }

    /// Non-destructive preview of `masks` over `image`.
    pub fn preview(&self, image: &RgbImage, masks: &[MaskResult], kind: PreviewKind) -> Result<RgbImage> {
        let preview = match kind {
            PreviewKind::Outline { width } => effects::render_outline(image, masks, width)?,
            PreviewKind::Heatmap { alpha } => effects::render_heatmap(image, masks, alpha)?,
        };
        info!("rendered {:?} preview for {} masks", kind, masks.len());
        Ok(preview)
    }

    fn save_debug_image(&self, image: &RgbImage, filename: &str) -> Result<()> {
        if let Some(debug_config) = &self.debug {
            let output_path = debug_config.output_dir.join(filename);
            image
                .save(&output_path)
                .map_err(|e| Error::Encode(format!("failed to save debug image: {}", e)))?;
            debug!("debug: saved {}", output_path.display());
        }
        Ok(())
    }
}
