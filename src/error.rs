use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mask is {actual:?} but image is {expected:?} (width, height)")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("segmenter not ready: {0}")]
    NotReady(String),

    #[error("blur strength must be > 0, got {0}")]
    InvalidStrength(u32),

    #[error("outline width must be between 1 and 255, got {0}")]
    InvalidOutlineWidth(u32),

    #[error("heatmap alpha must be between 0.0 and 1.0, got {0}")]
    InvalidAlpha(f32),

    #[error("min area ratio must be between 0.0 and 1.0, got {0}")]
    InvalidMinAreaRatio(f64),

    #[error("max dimension must be > 0")]
    InvalidMaxDimension,

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("debug directory is not empty: {}", .0.display())]
    DebugDirNotEmpty(std::path::PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
