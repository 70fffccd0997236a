use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flexi_logger::{Logger, LoggerHandle};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

use privmask::codec;
use privmask::config::{
    AUTO_MASK_MAX_COUNT, AUTO_MASK_MIN_AREA_RATIO, DEFAULT_BLUR_STRENGTH, DEFAULT_HEATMAP_ALPHA,
    DEFAULT_OUTLINE_WIDTH, MAX_IMAGE_SIZE,
};
use privmask::models::SegmentResponse;
use privmask::{
    BlurType, Config, FilterParams, Mask, MaskResult, PreviewKind, PrivacyPipeline, SegmenterKind,
};

#[derive(Parser)]
#[command(name = "privmask")]
#[command(about = "Redact and preview segmented image regions")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Segmentation backend used when no masks are given
    #[arg(long, value_enum, default_value = "mock", global = true)]
    segmenter: SegmenterKind,

    /// Inputs with a longer side above this are downscaled first
    #[arg(long, default_value_t = MAX_IMAGE_SIZE, global = true)]
    max_size: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Blur, pixelate or fill the detected regions
    Filter {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Mask images (non-zero = inside); segment automatically when absent
        #[arg(long = "mask", value_name = "MASK")]
        masks: Vec<PathBuf>,

        #[arg(long, value_enum, default_value = "gaussian")]
        blur_type: BlurType,

        #[arg(long, default_value_t = DEFAULT_BLUR_STRENGTH)]
        strength: u32,

        /// Fill color for solid mode, as R,G,B
        #[arg(long, default_value = "0,0,0", value_parser = parse_color)]
        color: Rgb<u8>,

        #[arg(long, default_value_t = AUTO_MASK_MIN_AREA_RATIO)]
        min_area_ratio: f64,

        #[arg(long, default_value_t = AUTO_MASK_MAX_COUNT)]
        max_masks: usize,

        /// Where to write the filtered PNG
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Print the full response (data URI + regions) as JSON
        #[arg(long)]
        json: bool,

        /// Save debug outputs to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },
    /// Render an outline or heatmap preview of the regions
    Preview {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(value_enum)]
        kind: PreviewArg,

        #[arg(long = "mask", value_name = "MASK")]
        masks: Vec<PathBuf>,

        /// Outline band width in pixels
        #[arg(long, default_value_t = DEFAULT_OUTLINE_WIDTH)]
        width: u32,

        /// Heatmap blend weight
        #[arg(long, default_value_t = DEFAULT_HEATMAP_ALPHA)]
        alpha: f32,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// List the regions the segmenter finds, as JSON
    Segment {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[arg(long, default_value_t = AUTO_MASK_MIN_AREA_RATIO)]
        min_area_ratio: f64,

        #[arg(long, default_value_t = AUTO_MASK_MAX_COUNT)]
        max_masks: usize,
    },
    /// Report segmenter status as JSON
    Health,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PreviewArg {
    Outline,
    Heatmap,
}

fn parse_color(s: &str) -> Result<Rgb<u8>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got '{}'", s));
    }
    let mut channels = [0u8; 3];
    for (channel, part) in channels.iter_mut().zip(&parts) {
        *channel = part
            .parse()
            .map_err(|e| format!("invalid channel '{}': {}", part, e))?;
    }
    Ok(Rgb(channels))
}

/// Logs go to stderr; `RUST_LOG` overrides the level.
fn setup_logging(verbose: bool) -> Result<LoggerHandle> {
    let level = if verbose { "debug" } else { "info" };
    Logger::try_with_env_or_str(level)
        .context("Invalid log specification")?
        .start()
        .context("Logger initialization failed")
}

/// Decoded input, downscaled to the configured maximum.
struct LoadedImage {
    image: RgbImage,
    /// Dimensions before downscaling
    source_dimensions: (u32, u32),
    scale: f64,
}

fn load_image(path: &Path, max_size: u32) -> Result<LoadedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let img = codec::decode(&bytes).with_context(|| format!("Failed to decode {}", path.display()))?;
    log::info!("Image loaded: {}x{}", img.width(), img.height());

    let source_dimensions = img.dimensions();
    let (image, scale) = codec::resize_if_needed(img, max_size)?;
    Ok(LoadedImage {
        image,
        source_dimensions,
        scale,
    })
}

/// Load mask files drawn on the source image. Masks matching the source are
/// brought onto the downscaled grid; any other size is passed through and
/// rejected by the pipeline.
fn load_masks(paths: &[PathBuf], loaded: &LoadedImage) -> Result<Vec<MaskResult>> {
    let target = loaded.image.dimensions();
    let mut masks = Vec::new();
    for (id, path) in paths.iter().enumerate() {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let mut mask = codec::decode_mask(&bytes)
            .with_context(|| format!("Failed to decode mask {}", path.display()))?;
        if mask.dimensions() == loaded.source_dimensions && target != loaded.source_dimensions {
            let resized = image::imageops::resize(
                mask.as_gray(),
                target.0,
                target.1,
                image::imageops::FilterType::Nearest,
            );
            mask = Mask::from_gray(&resized);
        }
        masks.push(MaskResult::new(id as u32, mask));
    }
    Ok(masks)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let _logger = setup_logging(args.verbose)?;

    let mut config = Config {
        segmenter: args.segmenter,
        max_image_size: args.max_size,
        debug_dir: None,
    };

    match args.command {
        Command::Filter {
            image_path,
            masks,
            blur_type,
            strength,
            color,
            min_area_ratio,
            max_masks,
            output,
            json,
            debug_out,
        } => {
            config.debug_dir = debug_out;
            let pipeline = PrivacyPipeline::from_config(&config)?;
            let loaded = load_image(&image_path, config.max_image_size)?;
            let img = &loaded.image;

            let params = FilterParams::new()
                .with_blur_type(blur_type)
                .with_strength(strength)
                .with_fill_color(color)
                .with_min_area_ratio(min_area_ratio)
                .with_max_masks(max_masks);

            let outcome = if masks.is_empty() {
                pipeline.filter_auto(img, &params)?
            } else {
                let masks = load_masks(&masks, &loaded)?;
                pipeline.filter(img, &masks, &params)?
            };

            outcome
                .image
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;

            if json {
                let response = outcome.to_response(loaded.scale)?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("Processed {} regions -> {}", outcome.applied_regions.len(), output.display());
                for region in &outcome.applied_regions {
                    let b = region.bbox;
                    println!(
                        "  mask {} at ({}, {})-({}, {}) area {}",
                        region.mask_id, b.x1, b.y1, b.x2, b.y2, region.area
                    );
                }
            }
        }
        Command::Preview {
            image_path,
            kind,
            masks,
            width,
            alpha,
            output,
        } => {
            let pipeline = PrivacyPipeline::from_config(&config)?;
            let loaded = load_image(&image_path, config.max_image_size)?;
            let img = &loaded.image;

            let masks = if masks.is_empty() {
                let params = FilterParams::default();
                pipeline.segment(img, &params.segment_params())?
            } else {
                load_masks(&masks, &loaded)?
            };

            let kind = match kind {
                PreviewArg::Outline => PreviewKind::Outline { width },
                PreviewArg::Heatmap => PreviewKind::Heatmap { alpha },
            };
            let preview = pipeline.preview(img, &masks, kind)?;
            preview
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
            println!("Preview of {} regions -> {}", masks.len(), output.display());
        }
        Command::Segment {
            image_path,
            min_area_ratio,
            max_masks,
        } => {
            let pipeline = PrivacyPipeline::from_config(&config)?;
            let img = load_image(&image_path, config.max_image_size)?.image;
            let params = FilterParams::new()
                .with_min_area_ratio(min_area_ratio)
                .with_max_masks(max_masks);
            params.validate()?;

            let masks = pipeline.segment(&img, &params.segment_params())?;
            let response = SegmentResponse::new(img.width(), img.height(), &masks);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Health => {
            let pipeline = PrivacyPipeline::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&pipeline.health())?);
        }
    }

    Ok(())
}
