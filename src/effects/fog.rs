//! Dense smoke / fog effect.
//!
//! A single broad noise field modulates a gray-white fog layer that is
//! alpha-blended over the image, followed by a wider blur for the soft
//! atmospheric look. Opacity is `intensity * opacity`, so with the default
//! `opacity = 0.6` a full-strength fog still lets 40% of the scene through.

use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::noise_field::{normalize, NoiseFieldSynthesizer, NoiseScale};
use super::{warn_if_out_of_range, Effect};
use crate::filters::blur::gaussian_blur_u8;
use crate::image::{Field, ThermalImage};

/// Tunables for [`SmokeFogEffect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogParams {
    /// Full-resolution noise with a heavy blur.
    pub scale: NoiseScale,
    /// Fog brightness where the noise is at its minimum.
    pub floor: f32,
    /// Added brightness where the noise is at its maximum.
    pub span: f32,
    /// Fog opacity at intensity 1.0.
    pub opacity: f32,
    pub blur_ksize: usize,
}

impl Default for FogParams {
    fn default() -> Self {
        Self {
            scale: NoiseScale::new(1, 51),
            floor: 180.0,
            span: 60.0,
            opacity: 0.6,
            blur_ksize: 7,
        }
    }
}

/// Patchy gray-white fog overlay.
#[derive(Debug, Clone, Default)]
pub struct SmokeFogEffect {
    params: FogParams,
}

impl SmokeFogEffect {
    pub fn new(params: FogParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FogParams {
        &self.params
    }

    /// Fog brightness per pixel, `floor..=floor + span`.
    pub fn fog_layer(&self, synth: &NoiseFieldSynthesizer, rng: &mut dyn RngCore) -> Field {
        let p = &self.params;
        let noise = normalize(synth.field(p.scale, rng).view());
        noise.mapv(|n| p.floor + n * p.span)
    }

    /// Blend weight of the fog layer at `intensity`.
    pub fn alpha(&self, intensity: f32) -> f32 {
        intensity * self.params.opacity
    }
}

impl Effect for SmokeFogEffect {
    fn name(&self) -> &'static str {
        "fog"
    }

    fn apply(&self, image: &ThermalImage, intensity: f32, rng: &mut dyn RngCore) -> ThermalImage {
        warn_if_out_of_range(self.name(), intensity);
        let synth = NoiseFieldSynthesizer::for_image(image);
        let fog = self.fog_layer(&synth, rng);
        let alpha = self.alpha(intensity);
        debug!(
            "fog: {}x{}, intensity {intensity}, alpha {alpha}",
            image.height(),
            image.width()
        );

        let mut blended = image.view().mapv(|v| v as f32);
        for ((y, x, _), v) in blended.indexed_iter_mut() {
            *v = *v * (1.0 - alpha) + fog[[y, x]] * alpha;
        }

        let quantized = blended.mapv(|v| v.clamp(0.0, 255.0) as u8);
        ThermalImage::from_parts(
            gaussian_blur_u8(quantized.view(), self.params.blur_ksize),
            image.order(),
        )
    }
}
