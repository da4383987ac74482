//! Detection counts across weather conditions.
//!
//! Each condition is rendered once from the source image and every detector
//! runs on the same rendered frame, so counts are comparable across models.

use log::info;
use rand::RngCore;

use super::detector::{Detector, HumanDetector};
use crate::error::Result;
use crate::image::ThermalImage;
use crate::pipeline::{PerturbationKind, PerturbationPipeline};

/// Detection count per model for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionCounts {
    pub kind: PerturbationKind,
    pub counts: Vec<(String, usize)>,
}

impl ConditionCounts {
    pub fn count(&self, model: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, count)| *count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RobustnessReport {
    pub intensity: f32,
    pub conditions: Vec<ConditionCounts>,
}

impl RobustnessReport {
    pub fn condition(&self, kind: PerturbationKind) -> Option<&ConditionCounts> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    pub fn count(&self, kind: PerturbationKind, model: &str) -> Option<usize> {
        self.condition(kind)?.count(model)
    }

    /// `count(a) - count(b)` under `kind`.
    pub fn difference(&self, kind: PerturbationKind, a: &str, b: &str) -> Option<i64> {
        let condition = self.condition(kind)?;
        Some(condition.count(a)? as i64 - condition.count(b)? as i64)
    }
}

/// Run every detector on the clean image and on snow and fog renderings.
///
/// # Arguments
/// * `detectors` - Display name and detector pairs
/// * `intensity` - Intensity used for both snow and fog
/// * `threshold` - Overrides each detector's configured cutoff
///
/// # Errors
/// The first detector failure.
pub fn robustness_test<D: Detector>(
    pipeline: &PerturbationPipeline,
    image: &ThermalImage,
    detectors: &[(&str, &HumanDetector<D>)],
    intensity: f32,
    threshold: Option<f32>,
    rng: &mut dyn RngCore,
) -> Result<RobustnessReport> {
    let mut conditions = Vec::with_capacity(PerturbationKind::ALL.len());

    for kind in PerturbationKind::ALL {
        let frame = pipeline.apply(image, kind, intensity, rng);
        let mut counts = Vec::with_capacity(detectors.len());
        for (name, detector) in detectors {
            let result = detector.detect(&frame, threshold)?;
            info!("robustness: {kind} / {name}: {} detections", result.count);
            counts.push((name.to_string(), result.count));
        }
        conditions.push(ConditionCounts { kind, counts });
    }

    Ok(RobustnessReport {
        intensity,
        conditions,
    })
}
