//! Detector abstraction and the end-to-end detection call.

use log::debug;
use ndarray::ArrayView3;

use super::postprocess::{DetectionPostprocessor, DetectionResult, RawDetections};
use super::preprocess::to_inference_tensor;
use super::{DetectionConfig, ImageSize};
use crate::error::Result;
use crate::image::ThermalImage;

/// An external object detector.
///
/// Receives a `(3, height, width)` RGB tensor in `[0, 1]` at the configured
/// inference size and returns unfiltered candidates in that tensor's pixel
/// coordinates.
pub trait Detector: Send + Sync {
    fn detect(&self, tensor: ArrayView3<f32>) -> Result<RawDetections>;
}

impl<F> Detector for F
where
    F: Fn(ArrayView3<f32>) -> Result<RawDetections> + Send + Sync,
{
    fn detect(&self, tensor: ArrayView3<f32>) -> Result<RawDetections> {
        self(tensor)
    }
}

/// A detector bundled with its input contract and confidence cutoff.
#[derive(Debug, Clone)]
pub struct HumanDetector<D> {
    detector: D,
    config: DetectionConfig,
}

impl<D: Detector> HumanDetector<D> {
    pub fn new(detector: D, config: DetectionConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.config.conf_threshold = threshold;
    }

    pub fn inner(&self) -> &D {
        &self.detector
    }

    /// Run the detector on `image` and return boxes in source pixels.
    ///
    /// # Arguments
    /// * `image` - Source image at any resolution
    /// * `threshold` - Overrides the configured confidence cutoff
    pub fn detect(&self, image: &ThermalImage, threshold: Option<f32>) -> Result<DetectionResult> {
        let inference = self.config.inference_size;
        let tensor = to_inference_tensor(image, inference)?;
        let raw = self.detector.detect(tensor.view())?;

        let threshold = threshold.unwrap_or(self.config.conf_threshold);
        let original = ImageSize::new(image.height(), image.width());
        let result = DetectionPostprocessor::new(threshold).process(&raw, inference, original)?;

        debug!(
            "detector: {} of {} candidates kept at threshold {threshold}",
            result.count,
            raw.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerturbError;

    fn fixed_detector(tensor: ArrayView3<f32>) -> Result<RawDetections> {
        assert_eq!(tensor.dim(), (3, 512, 512));
        RawDetections::new(
            vec![[0.0, 0.0, 100.0, 100.0], [10.0, 10.0, 20.0, 20.0]],
            vec![0.9, 0.4],
            vec![1, 1],
        )
    }

    #[test]
    fn test_detect_rescales_to_source() {
        let detector = HumanDetector::new(fixed_detector, DetectionConfig::default());
        let img = ThermalImage::filled(1024, 256, 50).unwrap();

        let result = detector.detect(&img, None).unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.boxes[0], [0.0, 0.0, 50.0, 200.0]);
    }

    #[test]
    fn test_threshold_override() {
        let detector = HumanDetector::new(fixed_detector, DetectionConfig::default());
        let img = ThermalImage::filled(512, 512, 50).unwrap();
        assert_eq!(detector.detect(&img, Some(0.3)).unwrap().count, 2);
    }

    #[test]
    fn test_detector_error_propagates() {
        fn failing(_: ArrayView3<f32>) -> Result<RawDetections> {
            Err(PerturbError::Detector("device lost".into()))
        }
        let detector = HumanDetector::new(failing, DetectionConfig::default());
        let img = ThermalImage::filled(8, 8, 0).unwrap();
        assert!(matches!(
            detector.detect(&img, None),
            Err(PerturbError::Detector(_))
        ));
    }
}
