//! Glue between the degradation engine and an external object detector.
//!
//! The detector itself is a black box behind the [`Detector`] trait. This
//! module owns everything around it:
//!
//! - **Preprocess** - resize to the inference resolution, normalize, CHW (`preprocess.rs`)
//! - **Postprocess** - confidence filtering and box rescaling (`postprocess.rs`)
//! - **HumanDetector** - preprocess, detect, postprocess in one call (`detector.rs`)
//! - **ModelRegistry** - named detectors loaded once on first use (`registry.rs`)
//! - **Robustness** - detection counts on clean, snowy and foggy variants (`robustness.rs`)

use serde::{Deserialize, Serialize};

pub mod preprocess;
pub mod postprocess;
pub mod detector;
pub mod registry;
pub mod robustness;

pub use detector::{Detector, HumanDetector};
pub use postprocess::{
    BoundingBox, DetectionPostprocessor, DetectionResult, RawDetections, FLAT_DETECTION_STRIDE,
};
pub use preprocess::to_inference_tensor;
pub use registry::ModelRegistry;
pub use robustness::{robustness_test, ConditionCounts, RobustnessReport};

/// Height and width of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub height: usize,
    pub width: usize,
}

impl ImageSize {
    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub const fn square(side: usize) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// Detector input resolution and default confidence cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub conf_threshold: f32,
    pub inference_size: ImageSize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.5,
            inference_size: ImageSize::square(512),
        }
    }
}
