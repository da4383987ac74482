//! Error type shared by the perturbation engine and detection glue.
//!
//! Every fallible entry point returns [`Result`]. Degenerate noise fields are
//! not an error: normalization recovers from them internally.

use thiserror::Error;

/// Errors raised by image construction, perturbation dispatch and detection
/// post-processing.
#[derive(Error, Debug)]
pub enum PerturbError {
    #[error("image must have non-zero dimensions, got {height}x{width}")]
    InvalidDimension { height: usize, width: usize },

    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),

    #[error("unsupported array rank {0} (expected (H, W) or (H, W, C))")]
    UnsupportedRank(usize),

    #[error("buffer of length {actual} does not match {height}x{width}x{channels}")]
    BufferLength {
        actual: usize,
        height: usize,
        width: usize,
        channels: usize,
    },

    #[error("unknown perturbation kind '{0}' (expected none, snow or fog)")]
    InvalidKind(String),

    #[error("detection sequences differ in length: {boxes} boxes, {scores} scores, {labels} labels")]
    ShapeMismatch {
        boxes: usize,
        scores: usize,
        labels: usize,
    },

    #[error("flat box buffer of length {0} is not a multiple of 4")]
    FlatBoxLength(usize),

    #[error("inference size must be non-zero, got {height}x{width}")]
    InvalidInferenceSize { height: usize, width: usize },

    #[error("failed to load model '{name}': {reason}")]
    ModelLoad { name: String, reason: String },

    #[error("detector failed: {0}")]
    Detector(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PerturbError>;
