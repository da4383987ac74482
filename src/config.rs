//! Engine configuration.
//!
//! Every tunable of the engine in one serializable struct. Missing fields
//! in a JSON document fall back to their defaults, so a config file only
//! needs the values it overrides:
//!
//! ```json
//! { "fog": { "opacity": 0.8 }, "intensity_policy": "clamp" }
//! ```

use serde::{Deserialize, Serialize};

use crate::detection::DetectionConfig;
use crate::effects::{FogParams, SnowParams};
use crate::error::Result;

/// What the pipeline does with intensities outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityPolicy {
    /// Hand the value to the effect unchanged.
    #[default]
    PassThrough,
    /// Clamp to `[0, 1]` first. NaN becomes 0.
    Clamp,
}

impl IntensityPolicy {
    pub fn resolve(&self, intensity: f32) -> f32 {
        match self {
            Self::PassThrough => intensity,
            Self::Clamp if intensity.is_nan() => 0.0,
            Self::Clamp => intensity.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub snow: SnowParams,
    pub fog: FogParams,
    pub detection: DetectionConfig,
    pub intensity_policy: IntensityPolicy,
}

impl EngineConfig {
    /// # Errors
    /// `Config` if the document is not valid JSON for this schema.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::NoiseScale;
    use crate::error::PerturbError;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snow.weights, [0.5, 0.3, 0.2]);
        assert_eq!(config.snow.coarse, NoiseScale::new(20, 21));
        assert_eq!(config.fog.blur_ksize, 7);
        assert!((config.fog.opacity - 0.6).abs() < 1e-6);
        assert!((config.detection.conf_threshold - 0.5).abs() < 1e-6);
        assert_eq!(config.detection.inference_size.width, 512);
        assert_eq!(config.intensity_policy, IntensityPolicy::PassThrough);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "fog": { "opacity": 0.8 }, "intensity_policy": "clamp" }"#)
                .unwrap();
        assert!((config.fog.opacity - 0.8).abs() < 1e-6);
        assert!((config.fog.floor - 180.0).abs() < 1e-6);
        assert_eq!(config.snow, SnowParams::default());
        assert_eq!(config.intensity_policy, IntensityPolicy::Clamp);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::default();
        config.snow.flakes_at_full = 100.0;
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_document_rejected() {
        let err = EngineConfig::from_json_str("{ \"snow\": 3 }").unwrap_err();
        assert!(matches!(err, PerturbError::Config(_)));
    }

    #[test]
    fn test_policy_resolve() {
        assert_eq!(IntensityPolicy::PassThrough.resolve(1.7), 1.7);
        assert_eq!(IntensityPolicy::Clamp.resolve(1.7), 1.0);
        assert_eq!(IntensityPolicy::Clamp.resolve(-0.2), 0.0);
        assert_eq!(IntensityPolicy::Clamp.resolve(f32::NAN), 0.0);
        assert!(IntensityPolicy::PassThrough.resolve(f32::NAN).is_nan());
    }
}
