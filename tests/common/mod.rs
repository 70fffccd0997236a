mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from privmask for tests
pub use privmask::{
    BlurType, BoundingBox, Error, FilterParams, Mask, MaskResult, PreviewKind, PrivacyPipeline,
};
