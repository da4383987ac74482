//! Perturbation dispatch.
//!
//! [`PerturbationPipeline`] maps a [`PerturbationKind`] and intensity to the
//! matching effect. `None` returns an identical copy. Intensity is handed
//! to the effect as given unless the pipeline is configured to clamp.

use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, IntensityPolicy};
use crate::effects::{Effect, FogParams, SmokeFogEffect, SnowEffect, SnowParams};
use crate::error::{PerturbError, Result};
use crate::image::{ChannelOrder, ThermalImage};

/// Intensity range drawn for snow by [`PerturbationPipeline::apply_random`].
pub const RANDOM_SNOW_INTENSITY: (f32, f32) = (0.4, 0.7);
/// Intensity range drawn for fog by [`PerturbationPipeline::apply_random`].
pub const RANDOM_FOG_INTENSITY: (f32, f32) = (0.5, 0.75);

/// Which degradation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationKind {
    None,
    Snow,
    Fog,
}

impl PerturbationKind {
    pub const ALL: [PerturbationKind; 3] = [Self::None, Self::Snow, Self::Fog];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Snow => "snow",
            Self::Fog => "fog",
        }
    }
}

impl fmt::Display for PerturbationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerturbationKind {
    type Err = PerturbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "clean" => Ok(Self::None),
            "snow" => Ok(Self::Snow),
            "fog" | "smoke" | "fog/smoke" => Ok(Self::Fog),
            _ => Err(PerturbError::InvalidKind(s.to_string())),
        }
    }
}

/// Dispatches perturbation requests to the snow and fog effects.
#[derive(Debug, Clone, Default)]
pub struct PerturbationPipeline {
    snow: SnowEffect,
    fog: SmokeFogEffect,
    policy: IntensityPolicy,
}

impl PerturbationPipeline {
    pub fn new(snow: SnowParams, fog: FogParams) -> Self {
        Self {
            snow: SnowEffect::new(snow),
            fog: SmokeFogEffect::new(fog),
            policy: IntensityPolicy::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.snow.clone(), config.fog.clone()).with_policy(config.intensity_policy)
    }

    pub fn with_policy(mut self, policy: IntensityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> IntensityPolicy {
        self.policy
    }

    pub fn snow(&self) -> &SnowEffect {
        &self.snow
    }

    pub fn fog(&self) -> &SmokeFogEffect {
        &self.fog
    }

    fn effect(&self, kind: PerturbationKind) -> Option<&dyn Effect> {
        match kind {
            PerturbationKind::None => None,
            PerturbationKind::Snow => Some(&self.snow as &dyn Effect),
            PerturbationKind::Fog => Some(&self.fog as &dyn Effect),
        }
    }

    /// Apply `kind` at `intensity` using `rng` for every random draw.
    pub fn apply(
        &self,
        image: &ThermalImage,
        kind: PerturbationKind,
        intensity: f32,
        rng: &mut dyn RngCore,
    ) -> ThermalImage {
        match self.effect(kind) {
            None => image.clone(),
            Some(effect) => {
                let intensity = self.policy.resolve(intensity);
                debug!("pipeline: applying {} at {intensity}", effect.name());
                effect.apply(image, intensity, rng)
            }
        }
    }

    /// Same as [`apply`](Self::apply) with the kind given by name.
    ///
    /// # Errors
    /// `InvalidKind` for names other than none, snow or fog (and aliases).
    pub fn apply_named(
        &self,
        image: &ThermalImage,
        kind: &str,
        intensity: f32,
        rng: &mut dyn RngCore,
    ) -> Result<ThermalImage> {
        let kind: PerturbationKind = kind.parse()?;
        Ok(self.apply(image, kind, intensity, rng))
    }

    /// Apply with a generator seeded from `seed`, for reproducible output.
    pub fn apply_seeded(
        &self,
        image: &ThermalImage,
        kind: PerturbationKind,
        intensity: f32,
        seed: u64,
    ) -> ThermalImage {
        let mut rng = StdRng::seed_from_u64(seed);
        self.apply(image, kind, intensity, &mut rng)
    }

    /// Validate a raw `(height, width, 1 | 3)` array and apply `kind`.
    ///
    /// # Errors
    /// `InvalidDimension` or `UnsupportedChannels` from image validation.
    pub fn apply_array(
        &self,
        pixels: Array3<u8>,
        order: ChannelOrder,
        kind: PerturbationKind,
        intensity: f32,
        rng: &mut dyn RngCore,
    ) -> Result<ThermalImage> {
        let image = ThermalImage::from_array(pixels, order)?;
        Ok(self.apply(&image, kind, intensity, rng))
    }

    /// Pick snow or fog with equal odds and a kind-specific random intensity.
    ///
    /// # Returns
    /// Perturbed image, the chosen kind and the intensity used
    pub fn apply_random(
        &self,
        image: &ThermalImage,
        rng: &mut dyn RngCore,
    ) -> (ThermalImage, PerturbationKind, f32) {
        let (kind, (lo, hi)) = if rng.gen_bool(0.5) {
            (PerturbationKind::Snow, RANDOM_SNOW_INTENSITY)
        } else {
            (PerturbationKind::Fog, RANDOM_FOG_INTENSITY)
        };
        let intensity = rng.gen_range(lo..hi);
        (self.apply(image, kind, intensity, rng), kind, intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> ThermalImage {
        let px = Array3::from_shape_fn((24, 36, 3), |(y, x, c)| ((y * 7 + x * 3 + c) % 256) as u8);
        ThermalImage::from_array(px, ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn test_none_is_identity_for_any_intensity() {
        let pipeline = PerturbationPipeline::default();
        let img = test_image();
        for intensity in [-1.0, 0.0, 0.5, 1.0, 7.5] {
            let out = pipeline.apply_seeded(&img, PerturbationKind::None, intensity, 1);
            assert_eq!(out, img);
        }
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("snow".parse::<PerturbationKind>().unwrap(), PerturbationKind::Snow);
        assert_eq!(" Fog ".parse::<PerturbationKind>().unwrap(), PerturbationKind::Fog);
        assert_eq!("Fog/Smoke".parse::<PerturbationKind>().unwrap(), PerturbationKind::Fog);
        assert_eq!("none".parse::<PerturbationKind>().unwrap(), PerturbationKind::None);
        for kind in PerturbationKind::ALL {
            assert_eq!(kind.to_string().parse::<PerturbationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let pipeline = PerturbationPipeline::default();
        let mut rng = StdRng::seed_from_u64(0);
        let err = pipeline
            .apply_named(&test_image(), "rain", 0.5, &mut rng)
            .unwrap_err();
        assert!(matches!(err, PerturbError::InvalidKind(ref k) if k == "rain"));
        assert!(err.to_string().contains("rain"));
    }

    #[test]
    fn test_dispatch_changes_image() {
        let pipeline = PerturbationPipeline::default();
        let img = test_image();
        let snow = pipeline.apply_seeded(&img, PerturbationKind::Snow, 0.9, 3);
        let fog = pipeline.apply_seeded(&img, PerturbationKind::Fog, 0.9, 3);
        assert_ne!(snow, img);
        assert_ne!(fog, img);
        assert_eq!(snow.dim(), img.dim());
        assert_eq!(fog.dim(), img.dim());
    }

    #[test]
    fn test_seeded_reproducible() {
        let pipeline = PerturbationPipeline::default();
        let img = test_image();
        for kind in [PerturbationKind::Snow, PerturbationKind::Fog] {
            let a = pipeline.apply_seeded(&img, kind, 0.6, 1234);
            let b = pipeline.apply_seeded(&img, kind, 0.6, 1234);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_apply_array_validates() {
        let pipeline = PerturbationPipeline::default();
        let mut rng = StdRng::seed_from_u64(0);
        let empty = Array3::<u8>::zeros((0, 10, 3));
        let err = pipeline
            .apply_array(empty, ChannelOrder::Rgb, PerturbationKind::Snow, 0.5, &mut rng)
            .unwrap_err();
        assert!(matches!(err, PerturbError::InvalidDimension { .. }));

        let gray = Array3::<u8>::from_elem((10, 12, 1), 50);
        let out = pipeline
            .apply_array(gray, ChannelOrder::Rgb, PerturbationKind::Fog, 0.5, &mut rng)
            .unwrap();
        assert_eq!(out.dim(), (10, 12, 3));
    }

    #[test]
    fn test_random_perturbation_ranges() {
        let pipeline = PerturbationPipeline::default();
        let img = ThermalImage::filled(16, 16, 100).unwrap();
        let mut rng = StdRng::seed_from_u64(77);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            let (out, kind, intensity) = pipeline.apply_random(&img, &mut rng);
            assert_eq!(out.dim(), img.dim());
            let (lo, hi) = match kind {
                PerturbationKind::Snow => RANDOM_SNOW_INTENSITY,
                PerturbationKind::Fog => RANDOM_FOG_INTENSITY,
                PerturbationKind::None => panic!("random perturbation returned none"),
            };
            assert!(intensity >= lo && intensity < hi);
            seen.insert(kind);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_clamp_policy_bounds_intensity() {
        let img = ThermalImage::filled(20, 20, 0).unwrap();
        let clamped = PerturbationPipeline::default().with_policy(IntensityPolicy::Clamp);
        let a = clamped.apply_seeded(&img, PerturbationKind::Fog, 3.0, 9);
        let b = clamped.apply_seeded(&img, PerturbationKind::Fog, 1.0, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pass_through_policy_keeps_out_of_range() {
        let img = ThermalImage::filled(20, 20, 20).unwrap();
        let pipeline = PerturbationPipeline::default();
        assert_eq!(pipeline.policy(), IntensityPolicy::PassThrough);

        let over = pipeline.apply_seeded(&img, PerturbationKind::Fog, 3.0, 9);
        let nominal = pipeline.apply_seeded(&img, PerturbationKind::Fog, 1.0, 9);
        assert_ne!(over, nominal);
        assert!(over.pixels().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_clamp_policy_maps_nan_to_zero() {
        let img = ThermalImage::filled(20, 20, 90).unwrap();
        let clamped = PerturbationPipeline::default().with_policy(IntensityPolicy::Clamp);
        let out = clamped.apply_seeded(&img, PerturbationKind::Fog, f32::NAN, 4);
        assert_eq!(out, img);
    }
}
