use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the sampling/overlay/assembly pipeline.
///
/// Mid-stream decode failures are not represented here: the sampler treats
/// them as end of data and keeps the frames it already has.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read source video {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("no frames to assemble")]
    EmptySequence,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("frame size mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: i32,
        left_height: i32,
        right_width: i32,
        right_height: i32,
    },

    #[error("unsupported output container: {0}")]
    UnsupportedContainer(String),

    #[error("video writer could not be opened for {0}")]
    WriterUnavailable(PathBuf),

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
