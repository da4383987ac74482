//! Detection post-processing: confidence filtering and coordinate rescaling.
//!
//! Candidates are kept in the order the detector produced them. No sorting
//! and no duplicate suppression happen here.

use serde::{Deserialize, Serialize};

use super::ImageSize;
use crate::error::{PerturbError, Result};

/// Axis-aligned box as `[x1, y1, x2, y2]` in pixels.
pub type BoundingBox = [f32; 4];

/// Values per detection in [`DetectionResult::to_flat`]:
/// `x1, y1, x2, y2, score, label`.
pub const FLAT_DETECTION_STRIDE: usize = 6;

/// Unfiltered detector output in inference-resolution pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetections {
    pub boxes: Vec<BoundingBox>,
    pub scores: Vec<f32>,
    pub labels: Vec<i64>,
}

impl RawDetections {
    /// # Errors
    /// `ShapeMismatch` if the three sequences differ in length.
    pub fn new(boxes: Vec<BoundingBox>, scores: Vec<f32>, labels: Vec<i64>) -> Result<Self> {
        let raw = Self {
            boxes,
            scores,
            labels,
        };
        raw.validate()?;
        Ok(raw)
    }

    /// Build from a flat `x1, y1, x2, y2, ...` box buffer.
    ///
    /// # Errors
    /// `FlatBoxLength` if `boxes` is not a whole number of quadruples,
    /// `ShapeMismatch` if the counts then disagree.
    pub fn from_flat(boxes: &[f32], scores: &[f32], labels: &[i64]) -> Result<Self> {
        if boxes.len() % 4 != 0 {
            return Err(PerturbError::FlatBoxLength(boxes.len()));
        }
        let boxes = boxes
            .chunks_exact(4)
            .map(|b| [b[0], b[1], b[2], b[3]])
            .collect();
        Self::new(boxes, scores.to_vec(), labels.to_vec())
    }

    pub fn validate(&self) -> Result<()> {
        let (boxes, scores, labels) = (self.boxes.len(), self.scores.len(), self.labels.len());
        if boxes != scores || boxes != labels {
            return Err(PerturbError::ShapeMismatch {
                boxes,
                scores,
                labels,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Filtered detections in source-image pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub boxes: Vec<BoundingBox>,
    pub scores: Vec<f32>,
    pub labels: Vec<i64>,
    pub count: usize,
}

impl DetectionResult {
    /// Kept detections packed as `x1, y1, x2, y2, score, label` per entry,
    /// in detector order. Length is `count * FLAT_DETECTION_STRIDE`.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.count * FLAT_DETECTION_STRIDE);
        for ((bbox, &score), &label) in self.boxes.iter().zip(&self.scores).zip(&self.labels) {
            flat.extend_from_slice(bbox);
            flat.push(score);
            flat.push(label as f32);
        }
        flat
    }
}

/// Keeps candidates with `score >= threshold` and maps their boxes back to
/// the original image resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionPostprocessor {
    pub threshold: f32,
}

impl DetectionPostprocessor {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Filter and rescale raw detector output.
    ///
    /// # Arguments
    /// * `raw` - Detector output at `inference` resolution
    /// * `inference` - Resolution the detector ran at
    /// * `original` - Resolution of the source image
    ///
    /// # Errors
    /// `ShapeMismatch` for unequal sequence lengths, `InvalidInferenceSize`
    /// for a zero inference dimension.
    pub fn process(
        &self,
        raw: &RawDetections,
        inference: ImageSize,
        original: ImageSize,
    ) -> Result<DetectionResult> {
        raw.validate()?;
        if inference.is_empty() {
            return Err(PerturbError::InvalidInferenceSize {
                height: inference.height,
                width: inference.width,
            });
        }

        let mut result = DetectionResult::default();
        for ((bbox, &score), &label) in raw.boxes.iter().zip(&raw.scores).zip(&raw.labels) {
            if score >= self.threshold {
                result.boxes.push(rescale_box(*bbox, inference, original));
                result.scores.push(score);
                result.labels.push(label);
            }
        }
        result.count = result.boxes.len();

        Ok(result)
    }
}

impl Default for DetectionPostprocessor {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// Scale a box from `from` resolution to `to` resolution, per axis.
pub fn rescale_box(bbox: BoundingBox, from: ImageSize, to: ImageSize) -> BoundingBox {
    let scale_x = to.width as f32 / from.width as f32;
    let scale_y = to.height as f32 / from.height as f32;
    [
        bbox[0] * scale_x,
        bbox[1] * scale_y,
        bbox[2] * scale_x,
        bbox[3] * scale_y,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(scores: &[f32]) -> RawDetections {
        RawDetections::new(
            scores.iter().map(|&s| [s, s, s * 2.0, s * 2.0]).collect(),
            scores.to_vec(),
            vec![1; scores.len()],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_and_rescale() {
        let raw = RawDetections::new(vec![[0.0, 0.0, 100.0, 100.0]], vec![0.9], vec![1]).unwrap();
        let result = DetectionPostprocessor::new(0.5)
            .process(&raw, ImageSize::square(512), ImageSize::square(1024))
            .unwrap();

        assert_eq!(result.boxes, vec![[0.0, 0.0, 200.0, 200.0]]);
        assert_eq!(result.scores, vec![0.9]);
        assert_eq!(result.labels, vec![1]);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_below_threshold_dropped() {
        let raw = RawDetections::new(vec![[1.0, 2.0, 3.0, 4.0]], vec![0.3], vec![1]).unwrap();
        let result = DetectionPostprocessor::new(0.5)
            .process(&raw, ImageSize::square(512), ImageSize::square(512))
            .unwrap();

        assert!(result.boxes.is_empty());
        assert!(result.scores.is_empty());
        assert!(result.labels.is_empty());
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_threshold_inclusive() {
        let result = DetectionPostprocessor::new(0.5)
            .process(&raw(&[0.5]), ImageSize::square(8), ImageSize::square(8))
            .unwrap();
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_count_non_increasing_in_threshold() {
        let candidates = raw(&[0.05, 0.9, 0.3, 0.3, 0.71, 0.0, 1.0, 0.49]);
        let size = ImageSize::square(100);
        let mut previous = usize::MAX;
        for step in 0..=20 {
            let threshold = step as f32 * 0.05;
            let count = DetectionPostprocessor::new(threshold)
                .process(&candidates, size, size)
                .unwrap()
                .count;
            assert!(count <= previous);
            previous = count;
        }
        let all = DetectionPostprocessor::new(0.0)
            .process(&candidates, size, size)
            .unwrap();
        assert_eq!(all.count, candidates.len());
    }

    #[test]
    fn test_order_preserved() {
        let result = DetectionPostprocessor::new(0.2)
            .process(&raw(&[0.3, 0.9, 0.1, 0.6]), ImageSize::square(10), ImageSize::square(10))
            .unwrap();
        assert_eq!(result.scores, vec![0.3, 0.9, 0.6]);
    }

    #[test]
    fn test_axes_scaled_independently() {
        let b = rescale_box(
            [10.0, 20.0, 30.0, 40.0],
            ImageSize::new(512, 512),
            ImageSize::new(256, 1024),
        );
        assert_eq!(b, [20.0, 10.0, 60.0, 20.0]);
    }

    #[test]
    fn test_rescale_round_trip() {
        let inference = ImageSize::square(512);
        let original = ImageSize::new(480, 640);
        let bbox = [13.5, 77.25, 301.0, 499.9];
        let back = rescale_box(rescale_box(bbox, inference, original), original, inference);
        for (a, b) in bbox.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bad = RawDetections {
            boxes: vec![[0.0; 4]; 2],
            scores: vec![0.9],
            labels: vec![1, 1],
        };
        let err = DetectionPostprocessor::default()
            .process(&bad, ImageSize::square(4), ImageSize::square(4))
            .unwrap_err();
        assert!(matches!(
            err,
            PerturbError::ShapeMismatch {
                boxes: 2,
                scores: 1,
                labels: 2
            }
        ));
        assert!(RawDetections::new(vec![], vec![0.1], vec![]).is_err());
    }

    #[test]
    fn test_zero_inference_size_rejected() {
        let err = DetectionPostprocessor::default()
            .process(&raw(&[0.9]), ImageSize::new(0, 512), ImageSize::square(4))
            .unwrap_err();
        assert!(matches!(err, PerturbError::InvalidInferenceSize { .. }));
    }

    #[test]
    fn test_flat_round_trip_keeps_scores_and_labels() {
        let raw = RawDetections::from_flat(
            &[0.0, 0.0, 10.0, 10.0, 5.0, 5.0, 20.0, 20.0, 1.0, 2.0, 3.0, 4.0],
            &[0.9, 0.2, 0.6],
            &[3, 1, 7],
        )
        .unwrap();
        let result = DetectionPostprocessor::new(0.5)
            .process(&raw, ImageSize::square(10), ImageSize::square(20))
            .unwrap();

        let flat = result.to_flat();

        assert_eq!(flat.len(), result.count * FLAT_DETECTION_STRIDE);
        assert_eq!(
            flat,
            vec![
                0.0, 0.0, 20.0, 20.0, 0.9, 3.0, //
                2.0, 4.0, 6.0, 8.0, 0.6, 7.0,
            ]
        );
    }

    #[test]
    fn test_flat_rejects_partial_box() {
        let err = RawDetections::from_flat(&[0.0; 6], &[0.9], &[1]).unwrap_err();
        assert!(matches!(err, PerturbError::FlatBoxLength(6)));
        let err = RawDetections::from_flat(&[0.0; 8], &[0.9], &[1, 1]).unwrap_err();
        assert!(matches!(err, PerturbError::ShapeMismatch { boxes: 2, .. }));
    }
}
