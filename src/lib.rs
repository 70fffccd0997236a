pub mod codec;
pub mod config;
pub mod effects;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod segmentation;

pub use config::{BlurType, Config, FilterParams, PreviewKind, SegmenterKind};
pub use effects::{Effect, apply_effect, composite_masks, render_heatmap, render_outline};
pub use error::{Error, Result};
pub use models::{AppliedRegion, BoundingBox, Mask, MaskResult};
pub use pipeline::{FilterOutcome, PrivacyPipeline};
pub use segmentation::{SegmentParams, Segmenter};
