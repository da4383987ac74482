//! Ground snow effect.
//!
//! Creates winter conditions by:
//! 1. Blending coarse, medium and fine noise fields into a snow texture
//! 2. Thresholding the texture into irregular patches (bias, gain, gamma)
//! 3. Compositing a bright snow color weighted by `mask * intensity`
//! 4. Scattering sparse falling flakes, count proportional to intensity
//! 5. Softening seams with a small Gaussian blur

use log::debug;
use ndarray::Array3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::noise_field::{NoiseFieldSynthesizer, NoiseScale};
use super::{warn_if_out_of_range, Effect};
use crate::filters::blur::gaussian_blur_u8;
use crate::filters::draw::fill_circle;
use crate::image::{Field, ThermalImage};

/// Tunables for [`SnowEffect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowParams {
    /// Main snow coverage
    pub coarse: NoiseScale,
    /// Drifts
    pub medium: NoiseScale,
    /// Surface texture
    pub fine: NoiseScale,
    /// Weights of coarse, medium and fine layers.
    pub weights: [f32; 3],
    /// Subtracted from the normalized texture before `gain`.
    pub bias: f32,
    pub gain: f32,
    /// Exponent applied to the clamped mask; below 1 widens the patches.
    pub gamma: f32,
    pub snow_color: f32,
    /// Number of flakes at intensity 1.0.
    pub flakes_at_full: f32,
    pub flake_radius_min: usize,
    pub flake_radius_max: usize,
    pub flake_brightness_min: u8,
    pub flake_brightness_max: u8,
    pub blur_ksize: usize,
}

impl Default for SnowParams {
    fn default() -> Self {
        Self {
            coarse: NoiseScale::new(20, 21),
            medium: NoiseScale::new(8, 11),
            fine: NoiseScale::new(4, 5),
            weights: [0.5, 0.3, 0.2],
            bias: 0.3,
            gain: 2.0,
            gamma: 0.7,
            snow_color: 240.0,
            flakes_at_full: 800.0,
            flake_radius_min: 1,
            flake_radius_max: 2,
            flake_brightness_min: 200,
            flake_brightness_max: 254,
            blur_ksize: 3,
        }
    }
}

/// Patchy ground snow with sparse falling flakes.
#[derive(Debug, Clone, Default)]
pub struct SnowEffect {
    params: SnowParams,
}

impl SnowEffect {
    pub fn new(params: SnowParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SnowParams {
        &self.params
    }

    /// Per-pixel snow coverage in `[0, 1]`.
    ///
    /// Draws the coarse, medium and fine fields from `rng` in that order.
    pub fn mask(&self, synth: &NoiseFieldSynthesizer, rng: &mut dyn RngCore) -> Field {
        let p = &self.params;
        let texture = synth.blend(
            &[
                (p.coarse, p.weights[0]),
                (p.medium, p.weights[1]),
                (p.fine, p.weights[2]),
            ],
            rng,
        );
        texture.mapv(|v| ((v - p.bias) * p.gain).clamp(0.0, 1.0).powf(p.gamma))
    }

    /// Number of flakes drawn at `intensity`. Zero for non-positive input.
    pub fn flake_count(&self, intensity: f32) -> usize {
        (intensity * self.params.flakes_at_full).max(0.0) as usize
    }

    fn scatter_flakes(&self, canvas: &mut Array3<f32>, count: usize, rng: &mut dyn RngCore) {
        let p = &self.params;
        let (height, width, _) = canvas.dim();
        let r_max = p.flake_radius_max.max(p.flake_radius_min);
        let b_max = p.flake_brightness_max.max(p.flake_brightness_min);

        for _ in 0..count {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let radius = rng.gen_range(p.flake_radius_min..=r_max);
            let brightness = rng.gen_range(p.flake_brightness_min..=b_max);
            fill_circle(canvas, x, y, radius, brightness as f32);
        }
    }
}

impl Effect for SnowEffect {
    fn name(&self) -> &'static str {
        "snow"
    }

    fn apply(&self, image: &ThermalImage, intensity: f32, rng: &mut dyn RngCore) -> ThermalImage {
        warn_if_out_of_range(self.name(), intensity);
        let (height, width, _) = image.dim();
        let p = &self.params;

        let synth = NoiseFieldSynthesizer::for_image(image);
        let mask = self.mask(&synth, rng);

        // Composite snow color per channel
        let mut canvas = image.view().mapv(|v| v as f32);
        for ((y, x, _), v) in canvas.indexed_iter_mut() {
            let w = mask[[y, x]] * intensity;
            *v = *v * (1.0 - w) + p.snow_color * w;
        }

        let flakes = self.flake_count(intensity);
        debug!("snow: {height}x{width}, intensity {intensity}, {flakes} flakes");
        self.scatter_flakes(&mut canvas, flakes, rng);

        let quantized = canvas.mapv(|v| v.clamp(0.0, 255.0) as u8);
        ThermalImage::from_parts(gaussian_blur_u8(quantized.view(), p.blur_ksize), image.order())
    }
}
